// FFI bindings for C/C++/C#
use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int};
use std::slice;

use crate::{DetectorConfig, Frame, ShapeDetector, ShapeRecord};

/// Opaque handle to a detector instance
pub struct GShapeHandle {
    inner: ShapeDetector,
}

/// C-compatible shape record
#[repr(C)]
pub struct CShapeRecord {
    /// "<color> <shape>", owned by the library until gshape_free_results
    pub label: *mut c_char,
    pub x: c_int,
    pub y: c_int,
    pub width: c_int,
    pub height: c_int,
}

/// Create a detector
///
/// `config_json` may be null for the default edge configuration, otherwise it
/// is a (possibly partial) JSON document.
///
/// # Safety
/// - `config_json` must be null or a valid null-terminated string
/// - handle_out receives the handle, free it with gshape_free
#[no_mangle]
pub unsafe extern "C" fn gshape_new(
    config_json: *const c_char,
    handle_out: *mut *mut GShapeHandle,
) -> c_int {
    if handle_out.is_null() {
        return -1;
    }
    *handle_out = std::ptr::null_mut();

    let cfg = if config_json.is_null() {
        DetectorConfig::default()
    } else {
        let text = match CStr::from_ptr(config_json).to_str() {
            Ok(s) => s,
            Err(_) => return -2,
        };
        match DetectorConfig::from_json_str(text) {
            Ok(c) => c,
            Err(e) => {
                log::warn!("gshape_new: {}", e);
                return -2;
            }
        }
    };

    match ShapeDetector::new(cfg) {
        Ok(detector) => {
            *handle_out = Box::into_raw(Box::new(GShapeHandle { inner: detector }));
            0
        }
        Err(_) => -2,
    }
}

/// Detect shapes in a packed RGB8 frame
///
/// # Safety
/// - handle must be a valid pointer returned from gshape_new
/// - data must point to `width * height * 3` readable bytes
/// - results_out will be allocated and must be freed with gshape_free_results
#[no_mangle]
pub unsafe extern "C" fn gshape_detect_rgb(
    handle: *mut GShapeHandle,
    data: *const u8,
    width: u32,
    height: u32,
    results_out: *mut *mut CShapeRecord,
    count_out: *mut usize,
) -> c_int {
    if handle.is_null() || data.is_null() || results_out.is_null() || count_out.is_null() {
        return -1;
    }

    let detector = &(*handle).inner;
    let len = width as usize * height as usize * 3;
    let bytes = slice::from_raw_parts(data, len).to_vec();

    let frame = match Frame::from_rgb8(width, height, bytes) {
        Ok(f) => f,
        Err(_) => return -3,
    };

    let c_results = records_to_c(detector.detect(&frame)).into_boxed_slice();
    *count_out = c_results.len();
    *results_out = Box::into_raw(c_results) as *mut CShapeRecord;

    0
}

/// Free results returned from gshape_detect_rgb
///
/// # Safety
/// - results must be a pointer returned from gshape_detect_rgb
/// - count must match the count returned alongside it
#[no_mangle]
pub unsafe extern "C" fn gshape_free_results(results: *mut CShapeRecord, count: usize) {
    if results.is_null() {
        return;
    }

    let records = Box::from_raw(std::ptr::slice_from_raw_parts_mut(results, count));
    for record in records.iter() {
        if !record.label.is_null() {
            drop(CString::from_raw(record.label));
        }
    }
}

/// Free a detector
///
/// # Safety
/// handle must be a valid pointer returned from gshape_new
#[no_mangle]
pub unsafe extern "C" fn gshape_free(handle: *mut GShapeHandle) {
    if !handle.is_null() {
        drop(Box::from_raw(handle));
    }
}

/// Get library version
#[no_mangle]
pub extern "C" fn gshape_version() -> *const c_char {
    static VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), "\0");
    VERSION.as_ptr() as *const c_char
}

fn records_to_c(records: Vec<ShapeRecord>) -> Vec<CShapeRecord> {
    records
        .into_iter()
        .map(|r| {
            // Labels are built from fixed ASCII names, so an interior NUL never occurs
            let label = CString::new(r.label)
                .map(CString::into_raw)
                .unwrap_or(std::ptr::null_mut());
            CShapeRecord {
                label,
                x: r.bbox.x,
                y: r.bbox.y,
                width: r.bbox.width,
                height: r.bbox.height,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_red_square_through_c_abi() {
        let (w, h) = (120u32, 120u32);
        let mut data = vec![255u8; (w * h * 3) as usize];
        for y in 20..80 {
            for x in 20..80 {
                let i = ((y * w + x) * 3) as usize;
                data[i..i + 3].copy_from_slice(&[255, 0, 0]);
            }
        }

        unsafe {
            let mut handle: *mut GShapeHandle = std::ptr::null_mut();
            assert_eq!(gshape_new(std::ptr::null(), &mut handle), 0);
            assert!(!handle.is_null());

            let mut out: *mut CShapeRecord = std::ptr::null_mut();
            let mut count = 0usize;
            let rc = gshape_detect_rgb(handle, data.as_ptr(), w, h, &mut out, &mut count);
            assert_eq!(rc, 0);
            assert_eq!(count, 1);
            let record = &*out;
            assert_eq!(CStr::from_ptr(record.label).to_str().unwrap(), "Rojo Cuadrado");
            assert!((record.width - 60).abs() <= 2);

            gshape_free_results(out, count);
            gshape_free(handle);
        }
    }

    #[test]
    fn test_error_codes() {
        unsafe {
            let mut handle: *mut GShapeHandle = std::ptr::null_mut();
            let bad = CString::new(r#"{"blur_kernel_size": 4}"#).unwrap();
            assert_eq!(gshape_new(bad.as_ptr(), &mut handle), -2);
            assert!(handle.is_null());
            assert_eq!(gshape_new(std::ptr::null(), std::ptr::null_mut()), -1);

            assert_eq!(gshape_new(std::ptr::null(), &mut handle), 0);
            let mut out: *mut CShapeRecord = std::ptr::null_mut();
            let mut count = 0usize;
            let data = [0u8; 3];
            assert_eq!(
                gshape_detect_rgb(std::ptr::null_mut(), data.as_ptr(), 1, 1, &mut out, &mut count),
                -1
            );
            assert_eq!(gshape_detect_rgb(handle, data.as_ptr(), 0, 0, &mut out, &mut count), -3);
            gshape_free(handle);
        }
    }

    #[test]
    fn test_version_string() {
        let v = unsafe { CStr::from_ptr(gshape_version()) };
        assert_eq!(v.to_str().unwrap(), env!("CARGO_PKG_VERSION"));
    }
}
