//! The recovery session state machine
//!
//! ```text
//! Idle -> Discovering -> Identifying -> Staging -> SendingRegions
//!      -> SendingFlashFiles -> Cleanup -> Done
//! ```
//!
//! The first error from any stage moves the session to `Aborted`; the stage it
//! failed in stays available through [`Session::failed_stage`].

use crate::block::Framer;
use crate::device::{DeviceIdentity, DeviceProbe, DownloadDevice, Transport};
use crate::error::{Error, Result};
use crate::poll::{self, PollPolicy, Sleeper};
use crate::profile::{Profile, ProfileRegistry};
use crate::staging::{StagedSet, Stager};
use crate::transfer::{Orchestrator, Stage, TransferProgress, TransferStats};

/// Outcome of a completed session
#[derive(Debug)]
pub struct SessionReport {
    /// Strings the device reported
    pub identity: DeviceIdentity,
    /// Blocks and bytes sent
    pub stats: TransferStats,
    /// Staged files that could not be deleted
    pub cleanup_errors: Vec<Error>,
}

/// Everything known about the device once identification succeeded
struct SessionState<'r, D> {
    device: D,
    identity: DeviceIdentity,
    profile: &'r Profile,
}

/// One download-mode recovery run
pub struct Session<'r> {
    registry: &'r ProfileRegistry,
    poll: PollPolicy,
    stage: Stage,
    failed_stage: Option<Stage>,
}

impl<'r> Session<'r> {
    /// Create a session matching devices against `registry`
    pub fn new(registry: &'r ProfileRegistry) -> Self {
        Self {
            registry,
            poll: PollPolicy::default(),
            stage: Stage::Idle,
            failed_stage: None,
        }
    }

    /// Override discovery timing
    pub fn with_poll_policy(mut self, poll: PollPolicy) -> Self {
        self.poll = poll;
        self
    }

    /// Current stage
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Stage the session was in when it aborted
    pub fn failed_stage(&self) -> Option<Stage> {
        self.failed_stage
    }

    fn enter<P: TransferProgress + ?Sized>(&mut self, stage: Stage, progress: &mut P) {
        log::debug!("Session stage: {:?} -> {:?}", self.stage, stage);
        self.stage = stage;
        progress.stage(stage);
    }

    /// Run every stage to completion
    pub fn run<Pr, St, Sl, P>(
        &mut self,
        probe: &mut Pr,
        stager: &mut St,
        sleeper: &mut Sl,
        progress: &mut P,
    ) -> Result<SessionReport>
    where
        Pr: DeviceProbe,
        St: Stager,
        Sl: Sleeper + ?Sized,
        P: TransferProgress + ?Sized,
    {
        match self.run_stages(probe, stager, sleeper, progress) {
            Ok(report) => {
                self.enter(Stage::Done, progress);
                Ok(report)
            }
            Err(e) => {
                log::debug!("Session aborted in {:?}: {}", self.stage, e);
                self.failed_stage = Some(self.stage);
                self.enter(Stage::Aborted, progress);
                Err(e)
            }
        }
    }

    fn run_stages<Pr, St, Sl, P>(
        &mut self,
        probe: &mut Pr,
        stager: &mut St,
        sleeper: &mut Sl,
        progress: &mut P,
    ) -> Result<SessionReport>
    where
        Pr: DeviceProbe,
        St: Stager,
        Sl: Sleeper + ?Sized,
        P: TransferProgress + ?Sized,
    {
        self.enter(Stage::Discovering, progress);
        let policy = self.poll;
        let device = poll::poll_until(
            &policy,
            sleeper,
            || probe.probe(),
            |ev| progress.poll(ev),
        );

        self.enter(Stage::Identifying, progress);
        let mut state = self.identify(device, progress)?;

        self.enter(Stage::Staging, progress);
        let staged = stager.stage(state.profile)?;

        self.enter(Stage::SendingRegions, progress);
        let stats = self.transfer(&mut state, &staged, progress)?;

        self.enter(Stage::Cleanup, progress);
        let cleanup_errors = staged.cleanup();
        for e in &cleanup_errors {
            log::warn!("{}", e);
            progress.cleanup_failed(e);
        }

        Ok(SessionReport {
            identity: state.identity,
            stats,
            cleanup_errors,
        })
    }

    fn identify<D, P>(&mut self, mut device: D, progress: &mut P) -> Result<SessionState<'r, D>>
    where
        D: DownloadDevice,
        P: TransferProgress + ?Sized,
    {
        let identity = device.identify()?;
        progress.identified(&identity);

        let registry = self.registry;
        let profile = registry.lookup(&identity.product)?;
        log::info!("Matched profile for {}", profile.display_name());

        Ok(SessionState {
            device,
            identity,
            profile,
        })
    }

    /// Claim the interface, send everything, then release it on every path
    fn transfer<D, P>(
        &mut self,
        state: &mut SessionState<'r, D>,
        staged: &StagedSet,
        progress: &mut P,
    ) -> Result<TransferStats>
    where
        D: DownloadDevice,
        P: TransferProgress + ?Sized,
    {
        let profile = state.profile;
        let mut port = state.device.open_for_transfer()?;

        let mut orch = Orchestrator::new(&mut port, Framer::new(profile.header), progress);
        let sent = self.send_all(&mut orch, profile, staged);
        let stats = orch.stats();

        let closed = port.close();
        sent?;
        closed?;
        Ok(stats)
    }

    fn send_all<T, P>(
        &mut self,
        orch: &mut Orchestrator<'_, T, P>,
        profile: &Profile,
        staged: &StagedSet,
    ) -> Result<()>
    where
        T: Transport,
        P: TransferProgress + ?Sized,
    {
        orch.send_regions(&staged.boot_image, &profile.regions)?;

        self.enter(Stage::SendingFlashFiles, orch.progress_mut());
        orch.send_files(&staged.flash_files)
    }
}
