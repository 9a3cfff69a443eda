use anyhow::{anyhow, Result};
use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, RefreshKind, System};
use tracing::instrument;
use xcb::{
    screensaver::{QueryInfo, QueryInfoReply},
    x::{Atom, Drawable, GetProperty, GrabServer, InternAtom, UngrabServer, Window, ATOM_ANY},
    Connection, Xid,
};

use super::{ActiveWindowData, WindowManager};

fn intern_atom(conn: &Connection, name: &[u8]) -> Result<Atom> {
    let reply = conn.wait_for_reply(conn.send_request(&InternAtom {
        only_if_exists: false,
        name,
    }))?;
    Ok(reply.atom())
}

fn get_pid(conn: &Connection, window: Window, pid_atom: Atom) -> Result<Option<u32>> {
    let result = conn.wait_for_reply(conn.send_request(&GetProperty {
        delete: false,
        window,
        property: pid_atom,
        r#type: ATOM_ANY,
        long_offset: 0,
        long_length: 1,
    }))?;
    Ok(result.value::<u32>().first().copied())
}

fn get_active_window(
    conn: &Connection,
    root: Window,
    active_window_atom: Atom,
) -> Result<Option<Window>> {
    let result = conn.wait_for_reply(conn.send_request(&GetProperty {
        delete: false,
        window: root,
        property: active_window_atom,
        r#type: ATOM_ANY,
        long_offset: 0,
        long_length: 1,
    }))?;
    Ok(result
        .value::<Window>()
        .first()
        .copied()
        .filter(|window| !window.is_none()))
}

pub struct LinuxWindowManager {
    connection: Connection,
    preferred_screen: usize,
    active_window_atom: Atom,
    pid_atom: Atom,
    system: System,
}

impl LinuxWindowManager {
    pub fn new() -> Result<Self> {
        let (connection, preferred_screen) = xcb::Connection::connect(None)?;
        let active_window_atom = intern_atom(&connection, b"_NET_ACTIVE_WINDOW")?;
        let pid_atom = intern_atom(&connection, b"_NET_WM_PID")?;
        Ok(Self {
            connection,
            preferred_screen: preferred_screen.max(0) as usize,
            active_window_atom,
            pid_atom,
            system: System::new_with_specifics(
                RefreshKind::nothing().with_processes(ProcessRefreshKind::nothing().with_exe(
                    sysinfo::UpdateKind::OnlyIfNotSet,
                )),
            ),
        })
    }

    fn root(&self) -> Result<Window> {
        // Currently the application only supports 1 x11 screen.
        self.connection
            .get_setup()
            .roots()
            .nth(self.preferred_screen)
            .map(|screen| screen.root())
            .ok_or_else(|| anyhow!("Screen {} doesn't exist", self.preferred_screen))
    }

    fn process_path(&mut self, pid: u32) -> Option<String> {
        let pid = Pid::from_u32(pid);
        self.system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[pid]),
            true,
            ProcessRefreshKind::nothing().with_exe(sysinfo::UpdateKind::OnlyIfNotSet),
        );
        let process = self.system.process(pid)?;
        process
            .exe()
            .and_then(|v| v.to_str())
            .map(|v| v.to_string())
            .or_else(|| Some(process.name().to_string_lossy().to_string()))
    }

    #[instrument(skip(self))]
    fn get_active_inner(&mut self) -> Result<Option<ActiveWindowData>> {
        let root = self.root()?;
        let Some(active_window) = get_active_window(&self.connection, root, self.active_window_atom)?
        else {
            return Ok(None);
        };
        let Some(pid) = get_pid(&self.connection, active_window, self.pid_atom)? else {
            return Ok(None);
        };
        Ok(self
            .process_path(pid)
            .map(|path| ActiveWindowData::from_path(&path, pid)))
    }
}

impl WindowManager for LinuxWindowManager {
    #[instrument(skip(self))]
    fn get_active_window_data(&mut self) -> Result<Option<ActiveWindowData>> {
        let _ = self.connection.send_request(&GrabServer {});

        let result = self.get_active_inner();
        let _ = self.connection.send_request(&UngrabServer {});
        result
    }

    #[instrument(skip(self))]
    fn get_idle_time(&mut self) -> Result<u32> {
        let idle = self.connection.send_request(&QueryInfo {
            drawable: Drawable::Window(self.root()?),
        });
        let reply: QueryInfoReply = self.connection.wait_for_reply(idle)?;
        Ok(reply.ms_since_user_input())
    }
}
