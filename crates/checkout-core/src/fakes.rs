//! In-memory gateway and backend fakes that record every call.

use crate::error::{CheckoutError, CheckoutResult};
use crate::gateway::{
    ConfirmOutcome, ConfirmParams, ElementOptions, MountedElement, PaymentClient,
    PaymentSurface, SdkEnvironment, SessionBackend, SurfaceOptions,
};
use crate::session::{SessionRequest, SessionResponse};
use async_trait::async_trait;
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;
use tokio::sync::oneshot;

/// Shared call log for the environment, client, surface and element fakes
#[derive(Default)]
pub(crate) struct GatewayLog {
    pub loads: Cell<usize>,
    pub cancels: Cell<usize>,
    pub surfaces: RefCell<Vec<SurfaceOptions>>,
    pub mounts: RefCell<Vec<String>>,
    pub unmounts: Cell<usize>,
    pub confirms: RefCell<Vec<ConfirmParams>>,
    pub sleeps: RefCell<Vec<Duration>>,
    pub confirm_replies: RefCell<VecDeque<CheckoutResult<ConfirmOutcome>>>,
    /// Holds the next confirmation until the sender fires
    pub confirm_gate: RefCell<Option<oneshot::Receiver<()>>>,
    pub fail_unmount: Cell<bool>,
    pub fail_mount: Cell<bool>,
}

impl GatewayLog {
    pub fn push_confirm(&self, reply: CheckoutResult<ConfirmOutcome>) {
        self.confirm_replies.borrow_mut().push_back(reply);
    }
}

pub(crate) struct FakeEnvironment {
    log: Rc<GatewayLog>,
    existing: bool,
    load_error: Option<CheckoutError>,
    load_gate: RefCell<Option<oneshot::Receiver<()>>>,
}

impl FakeEnvironment {
    pub fn new(log: Rc<GatewayLog>) -> Self {
        Self {
            log,
            existing: false,
            load_error: None,
            load_gate: RefCell::new(None),
        }
    }

    pub fn with_existing_client(mut self) -> Self {
        self.existing = true;
        self
    }

    pub fn with_load_error(mut self, err: CheckoutError) -> Self {
        self.load_error = Some(err);
        self
    }

    pub fn with_load_gate(self, gate: oneshot::Receiver<()>) -> Self {
        *self.load_gate.borrow_mut() = Some(gate);
        self
    }
}

#[async_trait(?Send)]
impl SdkEnvironment for FakeEnvironment {
    type Client = FakeClient;

    fn existing_client(&self, _publishable_key: &str) -> Option<FakeClient> {
        self.existing.then(|| FakeClient {
            log: self.log.clone(),
        })
    }

    async fn load_client(&self, _publishable_key: &str) -> CheckoutResult<FakeClient> {
        self.log.loads.set(self.log.loads.get() + 1);
        let gate = self.load_gate.borrow_mut().take();
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        match &self.load_error {
            Some(err) => Err(err.clone()),
            None => Ok(FakeClient {
                log: self.log.clone(),
            }),
        }
    }

    fn cancel_pending_load(&self) {
        self.log.cancels.set(self.log.cancels.get() + 1);
    }

    async fn sleep(&self, duration: Duration) {
        self.log.sleeps.borrow_mut().push(duration);
        tokio::time::sleep(duration).await;
    }
}

pub(crate) struct FakeClient {
    log: Rc<GatewayLog>,
}

#[async_trait(?Send)]
impl PaymentClient for FakeClient {
    type Surface = FakeSurface;

    fn create_surface(&self, options: &SurfaceOptions) -> CheckoutResult<FakeSurface> {
        self.log.surfaces.borrow_mut().push(options.clone());
        Ok(FakeSurface {
            log: self.log.clone(),
        })
    }

    async fn confirm(
        &self,
        _surface: &FakeSurface,
        params: &ConfirmParams,
    ) -> CheckoutResult<ConfirmOutcome> {
        self.log.confirms.borrow_mut().push(params.clone());
        let gate = self.log.confirm_gate.borrow_mut().take();
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        let reply = self.log.confirm_replies.borrow_mut().pop_front();
        reply.unwrap_or_else(|| Ok(ConfirmOutcome::intent("pi_default", "succeeded", 0)))
    }
}

pub(crate) struct FakeSurface {
    log: Rc<GatewayLog>,
}

impl PaymentSurface for FakeSurface {
    type Element = FakeElement;

    fn mount(&self, anchor: &str, _options: &ElementOptions) -> CheckoutResult<FakeElement> {
        self.log.mounts.borrow_mut().push(anchor.to_string());
        if self.log.fail_mount.get() {
            return Err(CheckoutError::Configuration(format!("anchor {} not found", anchor)));
        }
        Ok(FakeElement {
            log: self.log.clone(),
        })
    }
}

pub(crate) struct FakeElement {
    log: Rc<GatewayLog>,
}

impl MountedElement for FakeElement {
    fn unmount(&mut self) -> CheckoutResult<()> {
        self.log.unmounts.set(self.log.unmounts.get() + 1);
        if self.log.fail_unmount.get() {
            return Err(CheckoutError::Internal("element already destroyed".into()));
        }
        Ok(())
    }
}

pub(crate) struct FakeBackend {
    pub calls: Cell<usize>,
    pub requests: RefCell<Vec<SessionRequest>>,
    /// Holds the response until the sender fires
    pub gate: RefCell<Option<oneshot::Receiver<()>>>,
    reply: CheckoutResult<SessionResponse>,
}

impl FakeBackend {
    pub fn new(reply: CheckoutResult<SessionResponse>) -> Self {
        Self {
            calls: Cell::new(0),
            requests: RefCell::new(Vec::new()),
            gate: RefCell::new(None),
            reply,
        }
    }
}

#[async_trait(?Send)]
impl SessionBackend for FakeBackend {
    async fn open_session(&self, request: &SessionRequest) -> CheckoutResult<SessionResponse> {
        self.calls.set(self.calls.get() + 1);
        self.requests.borrow_mut().push(request.clone());
        let gate = self.gate.borrow_mut().take();
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        self.reply.clone()
    }
}
