// SPDX-License-Identifier: MIT OR Apache-2.0
// SPDX-FileCopyrightText: 2026 rvdbg contributors

mod common;

#[cfg(test)]
mod tests
{
    use std::cell::RefCell;
    use std::rc::Rc;

    use color_eyre::eyre::Result;
    use rvdbg::debug::{DMCONTROL, DMSTATUS};
    use rvdbg::transport::TclSession;
    use rvdbg::{DebugError, Session};

    use crate::common::{ScriptedStream, test_config};

    fn open(replies: &[u8]) -> Result<(Session<TclSession>, Rc<RefCell<Vec<u8>>>)>
    {
        let config = test_config();
        let (stream, sent) = ScriptedStream::new(replies);
        let tcl = TclSession::from_stream(Box::new(stream), &config);
        Ok((Session::open(tcl, config)?, sent))
    }

    fn sent_text(sent: &Rc<RefCell<Vec<u8>>>) -> String
    {
        String::from_utf8_lossy(&sent.borrow()).into_owned()
    }

    #[test]
    fn dmi_access_is_captured() -> Result<()>
    {
        let (mut session, sent) = open(b"\x1a0x00000382\n\x1a")?;
        session.write_dmi(DMCONTROL, 0x1)?;
        assert_eq!(session.read_dmi(DMSTATUS)?, 0x382);
        assert_eq!(
            sent_text(&sent),
            "capture \"riscv dmi_write 0x10 0x1\"\x1acapture \"riscv dmi_read 0x11\"\x1a"
        );
        Ok(())
    }

    #[test]
    fn raw_commands_are_trimmed() -> Result<()>
    {
        let (mut session, sent) = open(b"Open On-Chip Debugger 0.12.0\r\n\x1a")?;
        assert_eq!(session.transport_mut().send("version")?, "Open On-Chip Debugger 0.12.0");
        assert_eq!(sent_text(&sent), "version\x1a");
        Ok(())
    }

    #[test]
    fn adapter_failures_are_reported() -> Result<()>
    {
        let (mut session, _) = open(b"Failed to read DMI register\x1a")?;
        assert!(matches!(session.read_dmi(DMSTATUS), Err(DebugError::AdapterFailure(_))));
        Ok(())
    }

    #[test]
    fn resume_over_tcl() -> Result<()>
    {
        let (mut session, _) = open(b"\x1a{0x00030c82}\x1a")?;
        session.resume()?;
        Ok(())
    }

    #[test]
    fn close_does_not_wait_for_a_reply() -> Result<()>
    {
        let (session, sent) = open(b"")?;
        session.close()?;
        assert_eq!(sent_text(&sent), "exit\x1a");
        Ok(())
    }
}
