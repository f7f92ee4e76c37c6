use std::ffi::CString;
use std::os::raw::{c_char, c_int};
use std::path::Path;
use std::ptr;

use once_cell::sync::Lazy;

use interceptor_common::{Command, ENV_COMMAND_LOG};
use interceptor_trace::{append_record, Record};

use crate::{c_str_array_to_vec, c_str_to_string};

type ExecveFn =
    unsafe extern "C" fn(*const c_char, *const *const c_char, *const *const c_char) -> c_int;

// Resolved on the first intercepted call, never during library load.
static REAL_EXECVE: Lazy<Option<ExecveFn>> = Lazy::new(|| unsafe { get_original("execve") });

// Get original function pointer via dlsym
unsafe fn get_original<T>(name: &str) -> Option<T> {
    let c_name = CString::new(name).ok()?;
    let func = libc::dlsym(libc::RTLD_NEXT, c_name.as_ptr());
    if func.is_null() {
        None
    } else {
        Some(std::mem::transmute_copy(&func))
    }
}

/// Replacement for libc `execve`.
///
/// Commands naming a regular file are modelled, rewritten to root-relative
/// paths, analysed and logged before being handed to the real `execve` with
/// the rewritten program and argv. Anything else (unresolved names, special
/// files) is forwarded untouched.
///
/// # Safety
/// - `filename` must be a valid, non-null C string pointer.
/// - `argv` and `envp` must be valid, null-terminated arrays of C string
///   pointers.
/// - This function forwards to the original libc implementation and thus
///   inherits its safety requirements.
#[no_mangle]
pub unsafe extern "C" fn execve(
    filename: *const c_char,
    argv: *const *const c_char,
    envp: *const *const c_char,
) -> c_int {
    let Some(real_execve) = *REAL_EXECVE else {
        *libc::__errno_location() = libc::ENOSYS;
        return -1;
    };

    if let Some(command) = prepare_command(filename, argv, envp) {
        if let Some((program, args)) = to_c_command(&command) {
            let mut arg_ptrs: Vec<*const c_char> = args.iter().map(|arg| arg.as_ptr()).collect();
            arg_ptrs.push(ptr::null());
            // does not return on success
            return real_execve(program.as_ptr(), arg_ptrs.as_ptr(), envp);
        }
    }

    real_execve(filename, argv, envp)
}

/// Runs the interception pipeline for one exec call. `None` means the call
/// is out of scope and must be forwarded exactly as it came in.
unsafe fn prepare_command(
    filename: *const c_char,
    argv: *const *const c_char,
    envp: *const *const c_char,
) -> Option<Command> {
    let program = c_str_to_string(filename)?;
    if !Path::new(&program).is_file() {
        return None;
    }

    let arguments = c_str_array_to_vec(argv);
    if arguments.is_empty() {
        return None;
    }
    let environment = c_str_array_to_vec(envp);
    let current_directory = std::env::current_dir().ok()?;

    let mut command = Command::new(
        program,
        current_directory.to_string_lossy().into_owned(),
        arguments,
        &environment,
    );

    command.make_relative();

    if let Err(err) = command.analyze() {
        eprintln!("{err}");
        eprintln!("{}", command.repr());
        std::process::exit(1);
    }

    log_command(&command);

    Some(command)
}

/// Appends the command to the log named by `INTERCEPTOR_command_log` in the
/// command's own environment. The environment map is cleared in the record;
/// a write failure never fails the build.
fn log_command(command: &Command) {
    let Some(log_path) = command.environment_variables.get(ENV_COMMAND_LOG) else {
        return;
    };
    let mut record = command.clone();
    record.environment_variables.clear();
    let _ = append_record(Path::new(log_path), &Record::Command(record));
}

fn to_c_command(command: &Command) -> Option<(CString, Vec<CString>)> {
    let program = CString::new(command.program.clone()).ok()?;
    let args = command
        .arguments
        .iter()
        .map(|arg| CString::new(arg.clone()).ok())
        .collect::<Option<Vec<_>>>()?;
    Some((program, args))
}
