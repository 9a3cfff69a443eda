use anyhow::{anyhow, Result};
use tracing::{error, instrument};
use windows::{
    core::PWSTR,
    Win32::{
        Foundation::{CloseHandle, GetLastError, BOOL, HANDLE},
        System::{
            Diagnostics::Debug::{
                FormatMessageW, FORMAT_MESSAGE_FROM_SYSTEM, FORMAT_MESSAGE_IGNORE_INSERTS,
            },
            SystemInformation::GetTickCount64,
            SystemServices::{LANG_ENGLISH, SUBLANG_ENGLISH_US},
            Threading::{
                OpenProcess, QueryFullProcessImageNameW, PROCESS_NAME_WIN32,
                PROCESS_QUERY_LIMITED_INFORMATION,
            },
        },
        UI::{
            Input::KeyboardAndMouse::{GetLastInputInfo, LASTINPUTINFO},
            WindowsAndMessaging::{GetForegroundWindow, GetWindowThreadProcessId},
        },
    },
};

use super::{ActiveWindowData, WindowManager};

/// Describes the calling thread's last error.
fn last_error_message() -> String {
    let err = unsafe { GetLastError() };
    let mut message_buffer = [0u16; 2048];
    let size = unsafe {
        FormatMessageW(
            FORMAT_MESSAGE_FROM_SYSTEM | FORMAT_MESSAGE_IGNORE_INSERTS,
            None,
            err.0,
            LANG_ENGLISH | (SUBLANG_ENGLISH_US << 10),
            PWSTR::from_raw(message_buffer.as_mut_ptr()),
            message_buffer.len() as u32,
            None,
        )
    };
    String::from_utf16_lossy(&message_buffer[..size as usize])
        .trim()
        .to_string()
}

/// Closes the process handle when dropped.
struct ProcessHandle(HANDLE);

impl Drop for ProcessHandle {
    fn drop(&mut self) {
        if let Err(e) = unsafe { CloseHandle(self.0) } {
            error!("Failed to close handle {e:?}");
        }
    }
}

#[instrument]
pub fn get_active() -> Result<Option<ActiveWindowData>> {
    let window = unsafe { GetForegroundWindow() };

    // Happens on the lock screen and while focus moves between windows.
    if window.is_invalid() {
        return Ok(None);
    }

    let mut id = 0u32;
    unsafe { GetWindowThreadProcessId(window, Some(&mut id)) };
    if id == 0 {
        return Err(anyhow!(
            "Failed to get active window process {}",
            last_error_message()
        ));
    }

    // The process may have exited since the window lookup, which surfaces as an error here.
    let process_handle = unsafe { OpenProcess(PROCESS_QUERY_LIMITED_INFORMATION, BOOL::from(false), id) }
        .map(ProcessHandle)
        .inspect_err(|e| error!("Failed to open process {e:?}"))?;

    let mut text: [u16; 4096] = [0; 4096];
    let process_path = unsafe { get_window_process_path(process_handle.0, &mut text) }
        .inspect_err(|e| error!("Failed to get window process path {e:?}"))?;

    Ok(Some(ActiveWindowData::from_path(&process_path, id)))
}

unsafe fn get_window_process_path(process_handle: HANDLE, text: &mut [u16]) -> Result<String> {
    unsafe {
        let mut length = text.len() as u32;
        QueryFullProcessImageNameW(
            process_handle,
            PROCESS_NAME_WIN32,
            PWSTR(text.as_mut_ptr()),
            &mut length,
        )?;
        Ok(String::from_utf16_lossy(&text[..length as usize]))
    }
}

pub fn get_idle_time() -> Result<u32> {
    let mut last: LASTINPUTINFO = LASTINPUTINFO {
        cbSize: size_of::<LASTINPUTINFO>() as u32,
        dwTime: 0,
    };
    let is_success = unsafe { GetLastInputInfo(&mut last) };
    if !is_success.as_bool() {
        error!("Failed to retrieve user idle time");
        return Err(anyhow!("Failed to retrieve user idle time"));
    }

    // dwTime wraps around together with the lower half of the tick count.
    let tick_count = unsafe { GetTickCount64() } as u32;
    Ok(tick_count.wrapping_sub(last.dwTime))
}

pub struct WindowsWindowManager {}

impl WindowsWindowManager {
    pub fn new() -> Self {
        Self {}
    }
}

impl Default for WindowsWindowManager {
    fn default() -> Self {
        Self::new()
    }
}

impl WindowManager for WindowsWindowManager {
    fn get_active_window_data(&mut self) -> Result<Option<ActiveWindowData>> {
        get_active().inspect_err(|e| error!("Failed to get active window {e:?}"))
    }

    fn get_idle_time(&mut self) -> Result<u32> {
        get_idle_time().inspect_err(|e| error!("Failed to get idle time {e:?}"))
    }
}
