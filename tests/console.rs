// SPDX-License-Identifier: MIT OR Apache-2.0
// SPDX-FileCopyrightText: 2026 rvdbg contributors

mod common;

#[cfg(test)]
mod tests
{
    use std::cell::RefCell;
    use std::rc::Rc;

    use color_eyre::eyre::Result;
    use rvdbg::debug::{DMCONTROL, DMSTATUS, TapInfo, TransferWidth};
    use rvdbg::transport::ConsoleSession;
    use rvdbg::{DebugError, Session, SessionConfig};

    use crate::common::{ScriptedStream, test_config};

    const BANNER: &[u8] = b"\xff\xfb\x01\xff\xfb\x03Open On-Chip Debugger\r\n> ";

    fn open(replies: &[u8], config: SessionConfig) -> Result<(Session<ConsoleSession>, Rc<RefCell<Vec<u8>>>)>
    {
        let mut script = BANNER.to_vec();
        script.extend_from_slice(replies);
        let (stream, sent) = ScriptedStream::new(&script);
        let console = ConsoleSession::from_stream(Box::new(stream), &config);
        Ok((Session::open(console, config)?, sent))
    }

    fn sent_text(sent: &Rc<RefCell<Vec<u8>>>) -> String
    {
        String::from_utf8_lossy(&sent.borrow()).into_owned()
    }

    #[test]
    fn dmi_access() -> Result<()>
    {
        let replies = b"riscv dmi_write 0x10 0x80000001\r\n\r\n> \
            riscv dmi_read 0x11\r\n0x00000382\r\n> ";
        let (mut session, sent) = open(replies, test_config())?;

        session.write_dmi(DMCONTROL, 0x8000_0001)?;
        assert_eq!(session.read_dmi(DMSTATUS)?, 0x382);
        assert_eq!(sent_text(&sent), "riscv dmi_write 0x10 0x80000001\nriscv dmi_read 0x11\n");
        Ok(())
    }

    #[test]
    fn halt_over_the_console() -> Result<()>
    {
        let replies = b"riscv dmi_write 0x10 0x80000001\r\n> \
            riscv dmi_read 0x11\r\n0x00000382\r\n> \
            riscv dmi_write 0x10 0x1\r\n> ";
        let (mut session, _) = open(replies, test_config())?;
        session.halt()?;
        Ok(())
    }

    #[test]
    fn adapter_failures_are_reported() -> Result<()>
    {
        let replies = b"riscv dmi_write 0x10 0x1\r\nFailed to write DMI register\r\n> ";
        let (mut session, _) = open(replies, test_config())?;
        assert!(matches!(
            session.write_dmi(DMCONTROL, 0x1),
            Err(DebugError::AdapterFailure(message)) if message.contains("Failed")
        ));
        Ok(())
    }

    #[test]
    fn closed_connection_is_a_transport_error() -> Result<()>
    {
        let (mut session, _) = open(b"", test_config())?;
        assert!(matches!(session.read_dmi(DMSTATUS), Err(DebugError::Transport { .. })));
        Ok(())
    }

    #[test]
    fn interrogation_picks_tap_and_width() -> Result<()>
    {
        let replies = b"scan_chain\r\n\
            \x20  TapName             Enabled  IdCode     Expected   IrLen IrCap IrMask\r\n\
            -- ------------------- -------- ---------- ---------- ----- ----- ------\r\n\
            \x200 cvw.cpu                Y     0x1002ac05 0x1002ac05     5 0x01  0x03\r\n> \
            riscv info\r\nhart.xlen 32\r\nhart.vlenb 0\r\n> \
            irscan cvw.cpu 0x10\r\n> \
            drscan cvw.cpu 32 0x10000\r\n00000071\r\n> \
            irscan cvw.cpu 0x10\r\n> \
            drscan cvw.cpu 32 0x0\r\n00000071\r\n> ";
        let config = SessionConfig {
            width: None,
            ..test_config()
        };
        let (mut session, sent) = open(replies, config)?;

        session.interrogate()?;
        assert_eq!(
            session.tap(),
            Some(&TapInfo {
                name: "cvw.cpu".into(),
                idcode: Some(0x1002_ac05),
            })
        );
        assert_eq!(session.xlen(), Some(32));
        assert_eq!(session.width(), TransferWidth::W32);

        // Raw scans go to the discovered tap
        session.reset_sticky_error()?;
        assert_eq!(
            sent_text(&sent),
            "scan_chain\nriscv info\n\
             irscan cvw.cpu 0x10\ndrscan cvw.cpu 32 0x10000\n\
             irscan cvw.cpu 0x10\ndrscan cvw.cpu 32 0x0\n"
        );
        Ok(())
    }

    #[test]
    fn configured_width_wins_over_xlen() -> Result<()>
    {
        let replies = b"scan_chain\r\n\r\n\r\n 0 riscv.cpu Y 0x00000001\r\n> riscv info\r\nhart.xlen 32\r\n> ";
        let (mut session, _) = open(replies, test_config())?;
        session.interrogate()?;
        assert_eq!(session.xlen(), Some(32));
        assert_eq!(session.width(), TransferWidth::W64);
        Ok(())
    }

    #[test]
    fn close_says_goodbye() -> Result<()>
    {
        let (session, sent) = open(b"", test_config())?;
        session.close()?;
        assert_eq!(sent_text(&sent), "exit\n");
        Ok(())
    }
}
