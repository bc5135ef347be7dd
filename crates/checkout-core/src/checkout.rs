//! # Checkout Orchestrator
//!
//! Drives one checkout attempt through staged initialization
//! (SDK load → session open → surface build → surface mount) and exposes the
//! imperative `process_payment` operation.
//!
//! ```text
//! Idle ─▶ Initializing ─▶ Ready(classification) ─▶ Processing ─▶ Succeeded | Failed
//! ```
//!
//! Execution is single-threaded and cooperative. Each stage is guarded by the
//! [`Stage`] machine so overlapping re-triggers are no-ops, and a boolean
//! processing flag, released on every exit path, rejects double submission.

use crate::error::{CheckoutError, CheckoutResult, GENERIC_FAILURE};
use crate::gateway::{
    Appearance, ClientOf, ConfirmOutcome, ConfirmParams, ElementOf, ElementOptions,
    MountedElement, PaymentClient, PaymentSurface, SdkEnvironment, SessionBackend, SurfaceOf,
    SurfaceOptions, DEFAULT_ANCHOR,
};
use crate::money::{format_minor_units, Currency};
use crate::outcome::{PaymentOutcome, SkipReason};
use crate::session::{
    Classification, PaymentResult, PaymentSession, SessionRequest, FREE_ORDER_AMOUNT,
    SMALL_ORDER_AMOUNT, STATUS_SUCCEEDED,
};
use crate::stage::Stage;
use crate::tenant::{CONFIRMATION_PATH, DEFAULT_TENANT_ID};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

/// Simulated processing time in test mode
pub const TEST_MODE_DELAY: Duration = Duration::from_millis(1000);

/// Simulated processing time for free and small orders
pub const SPECIAL_ORDER_DELAY: Duration = Duration::from_millis(500);

/// Construction parameters supplied by the embedder
#[derive(Debug, Clone)]
pub struct CheckoutOptions {
    /// Decimal amount (e.g. "25.00")
    pub amount: String,
    /// Currency code sent with the session request, as supplied
    pub currency: String,
    pub publishable_key: String,
    /// Simulate everything; no SDK load and no backend call
    pub test_mode: bool,
    /// Restaurant id sent with the session request
    pub tenant_id: String,
    /// Where the gateway returns after a redirect-based confirmation
    pub return_url: String,
    /// Anchor the payment element mounts into
    pub anchor: String,
    pub appearance: Appearance,
    pub element: ElementOptions,
}

impl CheckoutOptions {
    pub fn new(amount: impl Into<String>, publishable_key: impl Into<String>) -> Self {
        Self {
            amount: amount.into(),
            currency: Currency::USD.to_string(),
            publishable_key: publishable_key.into(),
            test_mode: false,
            tenant_id: DEFAULT_TENANT_ID.to_string(),
            return_url: CONFIRMATION_PATH.to_string(),
            anchor: DEFAULT_ANCHOR.to_string(),
            appearance: Appearance::default(),
            element: ElementOptions::default(),
        }
    }

    pub fn with_currency(mut self, currency: Currency) -> Self {
        self.currency = currency.to_string();
        self
    }

    /// Forward a code the backend understands even if it is not a known `Currency`
    pub fn with_currency_code(mut self, code: impl Into<String>) -> Self {
        self.currency = code.into();
        self
    }

    /// Currency for converting gateway minor units; unknown codes use two decimals
    pub fn minor_unit_currency(&self) -> Currency {
        self.currency.parse().unwrap_or_default()
    }

    pub fn with_test_mode(mut self, test_mode: bool) -> Self {
        self.test_mode = test_mode;
        self
    }

    pub fn with_tenant(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = tenant_id.into();
        self
    }

    pub fn with_return_url(mut self, return_url: impl Into<String>) -> Self {
        self.return_url = return_url.into();
        self
    }

    pub fn with_anchor(mut self, anchor: impl Into<String>) -> Self {
        self.anchor = anchor.into();
        self
    }

    pub fn with_appearance(mut self, appearance: Appearance) -> Self {
        self.appearance = appearance;
        self
    }

    pub fn with_payment_method_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.element.payment_method_types = types.into_iter().map(Into::into).collect();
        self
    }
}

/// Executor state as seen by the embedder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutStatus {
    Idle,
    Initializing,
    Ready(Classification),
    Processing,
    Succeeded,
    Failed,
}

/// What the embedder should render for the current state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutView {
    Loading,
    Error(String),
    FreeOrder,
    SmallOrder,
    TestMode,
    PreparingSurface,
    CardEntry,
}

struct CheckoutState<E: SdkEnvironment> {
    stage: Stage,
    status: CheckoutStatus,
    client: Option<Rc<ClientOf<E>>>,
    session: Option<PaymentSession>,
    surface: Option<Rc<SurfaceOf<E>>>,
    element: Option<ElementOf<E>>,
    error: Option<CheckoutError>,
}

impl<E: SdkEnvironment> Default for CheckoutState<E> {
    fn default() -> Self {
        Self {
            stage: Stage::Idle,
            status: CheckoutStatus::Idle,
            client: None,
            session: None,
            surface: None,
            element: None,
            error: None,
        }
    }
}

/// Releases the processing flag when dropped
struct ProcessingGuard<'a> {
    flag: &'a Cell<bool>,
}

impl<'a> ProcessingGuard<'a> {
    fn acquire(flag: &'a Cell<bool>) -> Option<Self> {
        if flag.replace(true) {
            return None;
        }
        Some(Self { flag })
    }
}

impl Drop for ProcessingGuard<'_> {
    fn drop(&mut self) {
        self.flag.set(false);
    }
}

/// One mounted checkout instance
pub struct Checkout<E: SdkEnvironment, B: SessionBackend> {
    options: CheckoutOptions,
    env: E,
    backend: B,
    state: RefCell<CheckoutState<E>>,
    processing: Cell<bool>,
    alive: Cell<bool>,
}

impl<E: SdkEnvironment, B: SessionBackend> Checkout<E, B> {
    pub fn new(options: CheckoutOptions, env: E, backend: B) -> Self {
        Self {
            options,
            env,
            backend,
            state: RefCell::new(CheckoutState::default()),
            processing: Cell::new(false),
            alive: Cell::new(true),
        }
    }

    pub fn options(&self) -> &CheckoutOptions {
        &self.options
    }

    pub fn environment(&self) -> &E {
        &self.env
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn stage(&self) -> Stage {
        self.state.borrow().stage
    }

    pub fn status(&self) -> CheckoutStatus {
        self.state.borrow().status
    }

    /// Inline error state for presentation
    pub fn error(&self) -> Option<CheckoutError> {
        self.state.borrow().error.clone()
    }

    pub fn classification(&self) -> Option<Classification> {
        self.state
            .borrow()
            .session
            .as_ref()
            .map(PaymentSession::classification)
    }

    pub fn is_ready(&self) -> bool {
        self.stage() == Stage::Ready
    }

    pub fn is_processing(&self) -> bool {
        self.processing.get()
    }

    pub fn is_alive(&self) -> bool {
        self.alive.get()
    }

    pub fn view(&self) -> CheckoutView {
        let state = self.state.borrow();
        let classification = state.session.as_ref().map(PaymentSession::classification);
        let loading = matches!(state.stage, Stage::Idle | Stage::LoadingSdk);

        if loading && classification != Some(Classification::Free) {
            return CheckoutView::Loading;
        }
        if let Some(err) = &state.error {
            return CheckoutView::Error(err.message());
        }
        match classification {
            Some(Classification::Free) => CheckoutView::FreeOrder,
            Some(Classification::SmallAmount) => CheckoutView::SmallOrder,
            _ if self.options.test_mode => CheckoutView::TestMode,
            _ if state.surface.is_none() => CheckoutView::PreparingSurface,
            _ => CheckoutView::CardEntry,
        }
    }

    /// Run every initialization stage whose prerequisite is met.
    ///
    /// Safe to call any number of times, including while a previous call is
    /// suspended: stages already entered are skipped.
    #[instrument(skip(self), fields(tenant = %self.options.tenant_id))]
    pub async fn initialize(&self) -> CheckoutResult<()> {
        self.load_sdk().await?;
        self.open_session().await?;
        self.build_surface()?;
        self.mount_surface()
    }

    /// Acquire the client library. Test mode completes without a client.
    pub async fn load_sdk(&self) -> CheckoutResult<()> {
        if !self.begin(Stage::LoadingSdk) {
            return Ok(());
        }

        if self.options.test_mode {
            debug!("test mode: skipping SDK load");
            return Ok(());
        }

        let key = self.options.publishable_key.trim();
        if key.is_empty() {
            return self.halt(CheckoutError::Configuration(
                "Stripe publishable key is missing".to_string(),
            ));
        }

        let client = match self.env.existing_client(key) {
            Some(client) => {
                debug!("reusing client already present in the host");
                client
            }
            None => match self.env.load_client(key).await {
                Ok(client) => client,
                Err(err) => return self.halt(err),
            },
        };

        if !self.is_alive() {
            debug!("discarding client loaded after teardown");
            return Ok(());
        }

        self.state.borrow_mut().client = Some(Rc::new(client));
        info!("payment SDK loaded");
        Ok(())
    }

    /// Open the payment session with the backend and classify it.
    pub async fn open_session(&self) -> CheckoutResult<()> {
        let sdk_ready = self.options.test_mode || self.state.borrow().client.is_some();
        if !sdk_ready || !self.begin(Stage::OpeningSession) {
            return Ok(());
        }

        if self.options.test_mode {
            self.settle_session(PaymentSession::test_mode());
            return Ok(());
        }

        let request = SessionRequest::new(
            &self.options.amount,
            self.options.currency.clone(),
            &self.options.tenant_id,
        );
        debug!(amount = %request.amount, currency = %request.currency, "opening payment session");

        let response = match self.backend.open_session(&request).await {
            Ok(response) => response,
            Err(err) => return self.halt(err),
        };

        if !self.is_alive() {
            debug!("discarding session opened after teardown");
            return Ok(());
        }

        match response.classify() {
            Ok(session) => {
                self.settle_session(session);
                Ok(())
            }
            Err(err) => self.halt(err),
        }
    }

    /// Construct the card surface for a normal session.
    pub fn build_surface(&self) -> CheckoutResult<()> {
        let (client, secret) = {
            let state = self.state.borrow();
            if self.options.test_mode || state.surface.is_some() {
                return Ok(());
            }
            let secret = state
                .session
                .as_ref()
                .filter(|s| s.classification() == Classification::Normal)
                .and_then(|s| s.client_secret())
                .map(str::to_string);
            match (state.client.clone(), secret) {
                (Some(client), Some(secret)) => (client, secret),
                _ => return Ok(()),
            }
        };

        if !self.begin(Stage::BuildingSurface) {
            return Ok(());
        }

        let options = SurfaceOptions::new(secret, self.options.appearance.clone());
        match client.create_surface(&options) {
            Ok(surface) => {
                self.state.borrow_mut().surface = Some(Rc::new(surface));
                debug!("card surface constructed");
                Ok(())
            }
            Err(err) => self.halt(err),
        }
    }

    /// Mount the constructed surface into its anchor, once.
    pub fn mount_surface(&self) -> CheckoutResult<()> {
        let surface = self.state.borrow().surface.clone();
        let Some(surface) = surface else {
            return Ok(());
        };

        if !self.begin(Stage::MountingSurface) {
            return Ok(());
        }

        match surface.mount(&self.options.anchor, &self.options.element) {
            Ok(element) => {
                let mut state = self.state.borrow_mut();
                state.element = Some(element);
                if state.stage.enter(Stage::Ready).is_ok() {
                    state.status = CheckoutStatus::Ready(Classification::Normal);
                }
                info!(anchor = %self.options.anchor, "card surface mounted");
                Ok(())
            }
            Err(err) => self.halt(err),
        }
    }

    /// Execute the payment for the current session.
    ///
    /// Never fails past this boundary: every error is folded into the outcome.
    #[instrument(skip(self), fields(tenant = %self.options.tenant_id))]
    pub async fn process_payment(&self) -> PaymentOutcome {
        if !self.is_alive() {
            return PaymentOutcome::Skipped(SkipReason::NotReady);
        }

        let Some(_guard) = ProcessingGuard::acquire(&self.processing) else {
            debug!("payment already in flight");
            return PaymentOutcome::Skipped(SkipReason::InFlight);
        };

        if self.options.test_mode {
            self.mark_processing();
            self.env.sleep(TEST_MODE_DELAY).await;
            return self.succeed(PaymentResult::simulated(self.options.amount.clone()));
        }

        let (stage, session, client, surface) = {
            let state = self.state.borrow();
            (
                state.stage,
                state.session.clone(),
                state.client.clone(),
                state.surface.clone(),
            )
        };

        if stage != Stage::Ready {
            debug!(?stage, "checkout not ready");
            return PaymentOutcome::Skipped(SkipReason::NotReady);
        }

        let Some(session) = session else {
            debug!("no payment session yet");
            return PaymentOutcome::Skipped(SkipReason::NotReady);
        };

        match session.classification() {
            Classification::Free => self.complete_special(&session, FREE_ORDER_AMOUNT).await,
            Classification::SmallAmount => {
                self.complete_special(&session, SMALL_ORDER_AMOUNT).await
            }
            Classification::Normal => {
                let (Some(client), Some(surface), Some(_)) =
                    (client, surface, session.client_secret())
                else {
                    debug!("card surface not ready");
                    return PaymentOutcome::Skipped(SkipReason::NotReady);
                };
                self.confirm(&client, &surface).await
            }
        }
    }

    /// Release the mounted element, abandon a pending SDK load and discard
    /// the session. Later calls are no-ops; so are late stage resolutions.
    pub fn teardown(&self) {
        if !self.alive.replace(false) {
            return;
        }

        let mut state = self.state.borrow_mut();
        if state.stage == Stage::LoadingSdk && state.client.is_none() && !self.options.test_mode {
            self.env.cancel_pending_load();
        }

        if let Some(mut element) = state.element.take() {
            if let Err(err) = element.unmount() {
                debug!(%err, "ignoring unmount failure; element may already be destroyed");
            }
        }

        state.surface = None;
        state.session = None;
        state.client = None;
        if state.stage != Stage::Halted {
            let _ = state.stage.enter(Stage::Halted);
        }
        info!("checkout torn down");
    }

    fn begin(&self, stage: Stage) -> bool {
        if !self.is_alive() {
            return false;
        }
        let mut state = self.state.borrow_mut();
        match state.stage.enter(stage) {
            Ok(()) => {
                if state.status == CheckoutStatus::Idle {
                    state.status = CheckoutStatus::Initializing;
                }
                debug!(?stage, "entered stage");
                true
            }
            Err(err) => {
                debug!(%err, "stage already entered");
                false
            }
        }
    }

    fn halt(&self, err: CheckoutError) -> CheckoutResult<()> {
        if !self.is_alive() {
            debug!(%err, "discarding failure after teardown");
            return Ok(());
        }
        error!(%err, "checkout initialization failed");
        let mut state = self.state.borrow_mut();
        let _ = state.stage.enter(Stage::Halted);
        state.status = CheckoutStatus::Failed;
        state.error = Some(err.clone());
        Err(err)
    }

    fn settle_session(&self, session: PaymentSession) {
        let classification = session.classification();
        let needs_surface = classification == Classification::Normal && !self.options.test_mode;

        let mut state = self.state.borrow_mut();
        state.session = Some(session);
        if !needs_surface && state.stage.enter(Stage::Ready).is_ok() {
            state.status = CheckoutStatus::Ready(classification);
        }
        info!(?classification, "payment session opened");
    }

    async fn complete_special(&self, session: &PaymentSession, amount: &str) -> PaymentOutcome {
        self.mark_processing();
        self.env.sleep(SPECIAL_ORDER_DELAY).await;
        let order_id = session.special_order_id().unwrap_or_default();
        self.succeed(PaymentResult::succeeded(order_id, amount))
    }

    async fn confirm(&self, client: &ClientOf<E>, surface: &SurfaceOf<E>) -> PaymentOutcome {
        self.mark_processing();
        let params = ConfirmParams::new(self.options.return_url.clone());
        debug!(return_url = %params.return_url, "confirming payment");

        match client.confirm(surface, &params).await {
            Ok(outcome) => self.settle_confirmation(outcome),
            Err(err) if err.message().is_empty() => {
                self.fail(CheckoutError::Unexpected(GENERIC_FAILURE.to_string()))
            }
            Err(err) => self.fail(err),
        }
    }

    fn settle_confirmation(&self, outcome: ConfirmOutcome) -> PaymentOutcome {
        if let Some(gateway_error) = outcome.error {
            let reason = gateway_error
                .message
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| GENERIC_FAILURE.to_string());
            return self.fail(CheckoutError::PaymentDeclined { reason });
        }

        match outcome.payment_intent {
            Some(intent) if intent.status == STATUS_SUCCEEDED => {
                let amount = format_minor_units(intent.amount, self.options.minor_unit_currency());
                self.succeed(PaymentResult::succeeded(intent.id, amount))
            }
            Some(intent) => self.fail(CheckoutError::UnknownStatus {
                status: intent.status,
            }),
            None => self.fail(CheckoutError::Unexpected(
                "Payment failed with unknown error".to_string(),
            )),
        }
    }

    fn mark_processing(&self) {
        if self.is_alive() {
            let mut state = self.state.borrow_mut();
            state.status = CheckoutStatus::Processing;
            state.error = None;
        }
    }

    fn succeed(&self, result: PaymentResult) -> PaymentOutcome {
        info!(
            transaction_id = %result.transaction_id,
            amount = %result.amount,
            "payment succeeded"
        );
        if self.is_alive() {
            self.state.borrow_mut().status = CheckoutStatus::Succeeded;
        }
        PaymentOutcome::Succeeded(result)
    }

    fn fail(&self, err: CheckoutError) -> PaymentOutcome {
        warn!(%err, "payment failed");
        if self.is_alive() {
            let mut state = self.state.borrow_mut();
            state.status = CheckoutStatus::Failed;
            state.error = Some(err.clone());
        }
        PaymentOutcome::Failed(err)
    }
}

impl<E: SdkEnvironment, B: SessionBackend> Drop for Checkout<E, B> {
    fn drop(&mut self) {
        self.teardown();
    }
}
