use anyhow::Result;
use tracing::{debug, instrument};
use windows::{
    core::{BSTR, VARIANT},
    Win32::{
        System::Com::{CoCreateInstance, CoInitializeEx, CLSCTX_INPROC_SERVER, COINIT_MULTITHREADED},
        UI::{
            Accessibility::{
                CUIAutomation, IUIAutomation, TreeScope_Descendants, UIA_ControlTypePropertyId,
                UIA_EditControlTypeId, UIA_ValueValuePropertyId,
            },
            WindowsAndMessaging::GetForegroundWindow,
        },
    },
};

use super::{domain::normalize_domain, DomainExtractor};

/// Reads the address bar of the focused browser window through UI Automation. The address bar is
/// the first edit control of the window in Chromium based browsers and in Firefox.
pub struct WindowsDomainExtractor {
    automation: IUIAutomation,
}

impl WindowsDomainExtractor {
    pub fn new() -> Result<Self> {
        // S_FALSE means COM was already initialized on this thread, which is fine.
        unsafe { CoInitializeEx(None, COINIT_MULTITHREADED) }.ok()?;
        let automation: IUIAutomation =
            unsafe { CoCreateInstance(&CUIAutomation, None, CLSCTX_INPROC_SERVER)? };
        Ok(Self { automation })
    }

    fn address_bar_value(&self) -> Result<Option<String>> {
        let window = unsafe { GetForegroundWindow() };
        if window.is_invalid() {
            return Ok(None);
        }
        let root = unsafe { self.automation.ElementFromHandle(window)? };
        let condition = unsafe {
            self.automation.CreatePropertyCondition(
                UIA_ControlTypePropertyId,
                &VARIANT::from(UIA_EditControlTypeId.0),
            )?
        };
        // Not finding anything is reported as an error by the bindings.
        let Ok(address_bar) = (unsafe { root.FindFirst(TreeScope_Descendants, &condition) }) else {
            return Ok(None);
        };
        let value = unsafe { address_bar.GetCurrentPropertyValue(UIA_ValueValuePropertyId)? };
        Ok(BSTR::try_from(&value).ok().map(|v| v.to_string()))
    }
}

impl DomainExtractor for WindowsDomainExtractor {
    #[instrument(skip(self))]
    fn get_current_domain(&mut self, process_name: &str) -> Result<Option<String>> {
        let value = self.address_bar_value()?;
        debug!(?value, "Address bar value");
        Ok(value.as_deref().and_then(normalize_domain))
    }
}
