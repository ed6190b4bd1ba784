// SPDX-License-Identifier: MIT OR Apache-2.0
// SPDX-FileCopyrightText: 2026 rvdbg contributors

mod common;

#[cfg(test)]
mod tests
{
    use color_eyre::eyre::Result;
    use rvdbg::debug::{DMCONTROL, DMSTATUS, DebugFault, HartStatus};
    use rvdbg::{DebugError, Session};

    use crate::common::{SimulatedDebugModule, test_config};

    fn open() -> Result<Session<SimulatedDebugModule>>
    {
        let mut session = Session::open(SimulatedDebugModule::new(), test_config())?;
        session.activate_dm()?;
        Ok(session)
    }

    #[test]
    fn halt_then_resume_checks_both_acknowledgements() -> Result<()>
    {
        let mut session = open()?;
        session.halt()?;
        assert!(session.transport().halted);
        session.resume()?;
        assert!(!session.transport().halted);

        assert_eq!(
            session.transport().writes_to(DMCONTROL),
            [0x1, 0x8000_0001, 0x1, 0x4000_0001]
        );
        assert_eq!(session.transport().reads_of(DMSTATUS), 2);
        Ok(())
    }

    #[test]
    fn halt_that_is_ignored_fails() -> Result<()>
    {
        let mut session = open()?;
        session.transport_mut().ignore_halt = true;
        assert!(matches!(session.halt(), Err(DebugError::ProtocolAssertion(_))));
        // The request is left asserted for whoever investigates
        assert_eq!(session.transport().writes_to(DMCONTROL).last(), Some(&0x8000_0001));
        Ok(())
    }

    #[test]
    fn step_restores_dcsr() -> Result<()>
    {
        let mut session = open()?;
        session.transport_mut().registers.insert(0x07b0, 0x4000_0003);
        session.halt()?;
        session.step()?;

        assert_eq!(
            session.transport().register_writes,
            [(0x07b0, 0x4000_0007), (0x07b0, 0x4000_0003)]
        );
        assert_eq!(session.transport().writes_to(DMCONTROL).last(), Some(&0x4000_0001));
        Ok(())
    }

    #[test]
    fn step_with_step_already_set_only_clears_it() -> Result<()>
    {
        let mut session = open()?;
        session.transport_mut().registers.insert(0x07b0, 0x4000_0007);
        session.step()?;
        assert_eq!(session.transport().register_writes, [(0x07b0, 0x4000_0003)]);
        Ok(())
    }

    #[test]
    fn reset_is_acknowledged() -> Result<()>
    {
        let mut session = open()?;
        session.reset_hart()?;
        assert_eq!(
            session.transport().writes_to(DMCONTROL),
            [0x1, 0x3, 0x1, 0x1000_0001]
        );
        assert!(!session.transport().have_reset);
        Ok(())
    }

    #[test]
    fn halt_on_reset() -> Result<()>
    {
        let mut session = open()?;
        session.set_halt_on_reset()?;
        session.reset_hart()?;
        session.clear_halt_on_reset()?;

        assert_eq!(
            session.transport().writes_to(DMCONTROL),
            [0x1, 0x9, 0x3, 0x1, 0x1000_0001, 0x5]
        );
        assert_eq!(
            session.hart_status()?,
            HartStatus {
                running: false,
                halted: true,
                resume_ack: false,
                have_reset: false,
            }
        );
        Ok(())
    }

    #[test]
    fn inactive_debug_module_is_diagnosed() -> Result<()>
    {
        let mut session = open()?;
        session.deactivate_dm()?;
        assert_eq!(session.diagnose()?, Some(DebugFault::InactiveDebugModule));
        session.reset_dm()?;
        assert_eq!(session.diagnose()?, None);
        Ok(())
    }

    #[test]
    fn sticky_dmi_errors_are_cleared() -> Result<()>
    {
        let mut session = open()?;
        session.transport_mut().dmistat = 2;
        assert_eq!(session.diagnose()?, Some(DebugFault::DmiStatus(2)));
        session.reset_sticky_error()?;
        assert_eq!(session.transport().dtmcs_writes, [0x1_0000]);
        session.hard_reset_dtm()?;
        assert_eq!(session.transport().dtmcs_writes, [0x1_0000, 0x2_0000]);
        assert_eq!(session.diagnose()?, None);
        Ok(())
    }

    #[test]
    fn idcode_checks() -> Result<()>
    {
        let mut session = open()?;
        assert_eq!(session.read_idcode()?, 0x1002_ac05);
        session.expect_idcode(0x1002_ac05)?;
        assert!(matches!(session.expect_idcode(0x1), Err(DebugError::ProtocolAssertion(_))));
        session.reset_tap()?;
        assert_eq!(session.transport().tap_resets, 1);
        Ok(())
    }
}
