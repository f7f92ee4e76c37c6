//! Preload interception library for build commands.
//!
//! Loaded via the dynamic loader's preload hook into every process a build
//! spawns, this library replaces `execve`. Each intercepted call is modelled
//! as a [`interceptor_common::Command`], rewritten to root-relative paths,
//! analysed for inputs and outputs, appended to the shared command log, and
//! then handed to the real `execve`.
//!
//! The library must stay loadable into arbitrary target binaries: it spawns
//! no threads, installs no signal handlers and does nothing at load time.
//! The pointer to the real `execve` and the analyser table are resolved
//! lazily on the first intercepted call.

#![allow(non_camel_case_types)]
#![cfg(unix)]

use std::ffi::CStr;
use std::os::raw::c_char;

mod exec;

pub use exec::execve;

/// Convert a C string pointer to a Rust `String`.
///
/// # Safety
/// `ptr` must be either null or a valid, null-terminated C string pointer.
pub unsafe fn c_str_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        None
    } else {
        Some(CStr::from_ptr(ptr).to_string_lossy().into_owned())
    }
}

/// Convert a null-terminated array of C string pointers to a `Vec<String>`.
///
/// # Safety
/// `ptr` must be either null or a valid, null-terminated array of C string
/// pointers.
pub unsafe fn c_str_array_to_vec(ptr: *const *const c_char) -> Vec<String> {
    let mut vec = Vec::new();
    if !ptr.is_null() {
        let mut i = 0;
        loop {
            let str_ptr = *ptr.offset(i);
            if str_ptr.is_null() {
                break;
            }
            vec.push(CStr::from_ptr(str_ptr).to_string_lossy().into_owned());
            i += 1;
        }
    }
    vec
}
