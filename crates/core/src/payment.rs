// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Payment provider contract.
//!
//! A provider is a record of closures plus a set of capability tags. The
//! payment manager picks the first active provider for a proxy that
//! accepts the requested method, and only calls the optional closures the
//! provider's capabilities advertise.

use alfio_domain::{PaymentMethod, PaymentProxy, Reservation, Transaction};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Optional behaviours a provider may support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// The client obtains a token that the server charges.
    ClientServerTokenRequest,
    /// Payments can be refunded.
    RefundRequest,
    /// The provider calls back with webhooks.
    WebhookHandler,
    /// Bank transfers matched offline.
    OfflineProcessor,
    /// The server creates the provider transaction before redirecting.
    ServerInitiatedTransaction,
}

/// What is being paid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentSpecification {
    pub reservation_id: String,
    pub event_id: i64,
    /// Amount in cents.
    pub amount: i64,
    pub currency: String,
    pub email: String,
    pub customer_name: String,
    pub description: String,
    pub method: PaymentMethod,
    /// Token obtained by the client, for token-based providers.
    pub gateway_token: Option<String>,
    /// Stable key so that a retried charge is not executed twice.
    pub idempotency_key: String,
}

/// Context a provider inspects to decide whether it handles a payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentContext {
    pub event_id: i64,
    pub proxy: PaymentProxy,
    pub method: PaymentMethod,
    pub amount: i64,
    pub currency: String,
}

/// Outcome of a payment attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentResult {
    /// Money has been charged.
    Successful {
        /// Provider transaction identifier.
        gateway_id: String,
    },
    /// The charge was refused.
    Failed {
        /// Error code to show to the buyer.
        error_code: String,
    },
    /// Accepted, confirmation will follow asynchronously.
    Pending {
        /// Provider transaction identifier.
        gateway_id: String,
    },
    /// The buyer must be redirected to the provider.
    Redirect {
        /// Where to send the buyer.
        url: String,
    },
}

impl PaymentResult {
    /// Whether the result confirms payment.
    #[must_use]
    pub const fn is_successful(&self) -> bool {
        matches!(self, Self::Successful { .. })
    }

    /// Error code of a failed result.
    #[must_use]
    pub fn error_code(&self) -> Option<&str> {
        match self {
            Self::Failed { error_code } => Some(error_code),
            _ => None,
        }
    }

    /// Builds a failed result.
    #[must_use]
    pub fn failed(error_code: &str) -> Self {
        Self::Failed {
            error_code: error_code.to_string(),
        }
    }
}

/// Status reported by a provider webhook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WebhookStatus {
    NotRelevant,
    TransactionInitiated,
    Successful,
    Failed,
    Cancelled,
    Error,
    Rejected,
}

/// A webhook after provider-specific parsing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookPayload {
    pub reservation_id: Option<String>,
    pub gateway_id: Option<String>,
    pub status: WebhookStatus,
}

/// Data returned when a provider transaction is initialized server side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionInit {
    pub gateway_id: String,
    /// Where to send the buyer, for redirect flows.
    pub redirect_url: Option<String>,
}

type AcceptFn = dyn Fn(&PaymentContext) -> bool + Send + Sync;
type PayFn = dyn Fn(&PaymentSpecification) -> PaymentResult + Send + Sync;
type WebhookFn = dyn Fn(&serde_json::Value) -> Option<WebhookPayload> + Send + Sync;
type InitFn = dyn Fn(&PaymentSpecification) -> Result<TransactionInit, String> + Send + Sync;
type DiscardFn = dyn Fn(&Transaction) -> bool + Send + Sync;
type CheckPendingFn = dyn Fn(&[Reservation]) -> Vec<String> + Send + Sync;
type RefundFn = dyn Fn(&Transaction, Option<i64>) -> bool + Send + Sync;

/// A payment provider record.
#[derive(Clone)]
pub struct PaymentProvider {
    pub id: String,
    pub proxy: PaymentProxy,
    pub methods: Vec<PaymentMethod>,
    pub capabilities: HashSet<Capability>,
    pub active: bool,
    accept: Arc<AcceptFn>,
    get_token_and_pay: Arc<PayFn>,
    process_webhook: Option<Arc<WebhookFn>>,
    init_transaction: Option<Arc<InitFn>>,
    discard_transaction: Option<Arc<DiscardFn>>,
    check_pending: Option<Arc<CheckPendingFn>>,
    refund: Option<Arc<RefundFn>>,
}

impl fmt::Debug for PaymentProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaymentProvider")
            .field("id", &self.id)
            .field("proxy", &self.proxy)
            .field("methods", &self.methods)
            .field("capabilities", &self.capabilities)
            .field("active", &self.active)
            .finish_non_exhaustive()
    }
}

impl PaymentProvider {
    /// Creates an active provider accepting every payment of its proxy and methods.
    #[must_use]
    pub fn new(
        id: &str,
        proxy: PaymentProxy,
        methods: Vec<PaymentMethod>,
        get_token_and_pay: impl Fn(&PaymentSpecification) -> PaymentResult + Send + Sync + 'static,
    ) -> Self {
        Self {
            id: id.to_string(),
            proxy,
            methods,
            capabilities: HashSet::new(),
            active: true,
            accept: Arc::new(|_| true),
            get_token_and_pay: Arc::new(get_token_and_pay),
            process_webhook: None,
            init_transaction: None,
            discard_transaction: None,
            check_pending: None,
            refund: None,
        }
    }

    /// Replaces the acceptance predicate.
    #[must_use]
    pub fn with_accept(
        mut self,
        accept: impl Fn(&PaymentContext) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.accept = Arc::new(accept);
        self
    }

    /// Adds a capability tag without behaviour.
    #[must_use]
    pub fn with_capability(mut self, capability: Capability) -> Self {
        self.capabilities.insert(capability);
        self
    }

    /// Enables webhook handling.
    #[must_use]
    pub fn with_webhook(
        mut self,
        process: impl Fn(&serde_json::Value) -> Option<WebhookPayload> + Send + Sync + 'static,
    ) -> Self {
        self.process_webhook = Some(Arc::new(process));
        self.with_capability(Capability::WebhookHandler)
    }

    /// Enables server-initiated transactions.
    #[must_use]
    pub fn with_server_transactions(
        mut self,
        init: impl Fn(&PaymentSpecification) -> Result<TransactionInit, String> + Send + Sync + 'static,
        discard: impl Fn(&Transaction) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.init_transaction = Some(Arc::new(init));
        self.discard_transaction = Some(Arc::new(discard));
        self.with_capability(Capability::ServerInitiatedTransaction)
    }

    /// Enables offline matching of pending reservations.
    #[must_use]
    pub fn with_offline_processor(
        mut self,
        check: impl Fn(&[Reservation]) -> Vec<String> + Send + Sync + 'static,
    ) -> Self {
        self.check_pending = Some(Arc::new(check));
        self.with_capability(Capability::OfflineProcessor)
    }

    /// Enables refunds.
    #[must_use]
    pub fn with_refund(
        mut self,
        refund: impl Fn(&Transaction, Option<i64>) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.refund = Some(Arc::new(refund));
        self.with_capability(Capability::RefundRequest)
    }

    /// Whether the provider advertises `capability`.
    #[must_use]
    pub fn has(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }

    /// Whether the provider handles the payment described by `context`.
    #[must_use]
    pub fn accepts(&self, context: &PaymentContext) -> bool {
        self.active
            && self.proxy == context.proxy
            && self.methods.contains(&context.method)
            && (self.accept)(context)
    }

    /// Charges the buyer.
    #[must_use]
    pub fn get_token_and_pay(&self, spec: &PaymentSpecification) -> PaymentResult {
        (self.get_token_and_pay)(spec)
    }

    /// Parses and interprets a webhook, if supported.
    #[must_use]
    pub fn process_webhook(&self, payload: &serde_json::Value) -> Option<WebhookPayload> {
        self.process_webhook.as_ref().and_then(|f| f(payload))
    }

    /// Initializes a provider transaction, if supported.
    ///
    /// # Errors
    ///
    /// Returns the provider message when initialization fails or is unsupported.
    pub fn init_transaction(&self, spec: &PaymentSpecification) -> Result<TransactionInit, String> {
        match &self.init_transaction {
            Some(f) => f(spec),
            None => Err(format!("provider {} cannot initialize transactions", self.id)),
        }
    }

    /// Discards a provider transaction, if supported.
    #[must_use]
    pub fn discard_transaction(&self, transaction: &Transaction) -> bool {
        self.discard_transaction
            .as_ref()
            .is_some_and(|f| f(transaction))
    }

    /// Returns the ids of reservations whose payment has been received.
    #[must_use]
    pub fn check_pending_reservations(&self, reservations: &[Reservation]) -> Vec<String> {
        self.check_pending
            .as_ref()
            .map(|f| f(reservations))
            .unwrap_or_default()
    }

    /// Refunds `amount` cents, or everything when `None`.
    #[must_use]
    pub fn refund(&self, transaction: &Transaction, amount: Option<i64>) -> bool {
        self.refund.as_ref().is_some_and(|f| f(transaction, amount))
    }
}
