// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Payment provider registry.
//!
//! Providers are looked up by proxy and method; the first active one that
//! accepts the payment wins. The methods an event can offer are cached per
//! event in an [`ExpiringCache`].

use alfio::{ExpiringCache, PaymentContext, PaymentProvider, PaymentResult};
use alfio_domain::{Event, PaymentMethod, PaymentProxy, TicketCategory};
use alfio_persistence::Store;
use tracing::debug;

use crate::error::ServiceError;
use crate::settings::ReservationSettings;

/// Failure codes returned to the buyer during checkout.
pub mod codes {
    /// A ticket holder is not allowed by the category's group.
    pub const WHITELIST: &str = "error.STEP2_WHITELIST";
    /// The method is blacklisted for a reserved category.
    pub const PAYMENT_METHOD_BLACKLISTED: &str = "error.STEP2_PAYMENT_METHOD_BLACKLISTED";
    /// The reservation could not enter payment.
    pub const UNABLE_TO_TRANSITION: &str = "error.STEP2_UNABLE_TO_TRANSITION";
    /// The promo code has been used up by concurrent reservations.
    pub const DISCOUNT_CODE_USAGE_EXCEEDED: &str = "error.STEP2_DISCOUNT_CODE_USAGE_EXCEEDED";
    /// Something went wrong outside the provider's control.
    pub const PAYMENT_UNEXPECTED: &str = "error.STEP2_PAYMENT_UNEXPECTED";
    /// No provider handles the selected proxy and method.
    pub const PROVIDER_NOT_FOUND: &str = "error.STEP2_PAYMENT_PROVIDER_NOT_FOUND";
}

/// Id of the built-in bank transfer provider.
pub const BANK_TRANSFER_PROVIDER: &str = "bank-transfer";
/// Id of the built-in on-site provider.
pub const ON_SITE_PROVIDER: &str = "on-site";

/// Bank transfers are accepted at checkout; payment is confirmed later.
#[must_use]
pub fn bank_transfer_provider() -> PaymentProvider {
    PaymentProvider::new(
        BANK_TRANSFER_PROVIDER,
        PaymentProxy::Offline,
        vec![PaymentMethod::BankTransfer],
        |spec| PaymentResult::Successful {
            gateway_id: format!("bank-transfer-{}", spec.reservation_id),
        },
    )
    // matching happens through manual confirmation
    .with_offline_processor(|_| Vec::new())
}

/// Payment is collected at the venue.
#[must_use]
pub fn on_site_provider() -> PaymentProvider {
    PaymentProvider::new(
        ON_SITE_PROVIDER,
        PaymentProxy::OnSite,
        vec![PaymentMethod::OnSite],
        |spec| PaymentResult::Successful {
            gateway_id: format!("on-site-{}", spec.reservation_id),
        },
    )
}

/// Registered providers plus the per-event method cache.
pub struct PaymentManager {
    providers: Vec<PaymentProvider>,
    methods_by_event: ExpiringCache<i64, Vec<PaymentMethod>>,
}

impl std::fmt::Debug for PaymentManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentManager")
            .field("providers", &self.providers)
            .finish_non_exhaustive()
    }
}

impl PaymentManager {
    /// Creates a registry holding the built-in providers.
    #[must_use]
    pub fn new(settings: &ReservationSettings) -> Self {
        Self {
            providers: vec![bank_transfer_provider(), on_site_provider()],
            methods_by_event: ExpiringCache::new(
                settings.payment_cache_capacity,
                settings.payment_cache_ttl,
            ),
        }
    }

    /// Registers a provider after the existing ones.
    pub fn register(&mut self, provider: PaymentProvider) {
        debug!(provider = %provider.id, proxy = %provider.proxy, "Payment provider registered");
        self.providers.push(provider);
    }

    /// Registered providers, in lookup order.
    #[must_use]
    pub fn providers(&self) -> &[PaymentProvider] {
        &self.providers
    }

    /// First active provider accepting `context`.
    #[must_use]
    pub fn lookup_provider(&self, context: &PaymentContext) -> Option<&PaymentProvider> {
        self.providers.iter().find(|p| p.accepts(context))
    }

    /// Provider registered under `id`.
    #[must_use]
    pub fn provider_by_id(&self, id: &str) -> Option<&PaymentProvider> {
        self.providers.iter().find(|p| p.id == id)
    }

    /// Active provider for `proxy`, regardless of method.
    #[must_use]
    pub fn provider_for_proxy(&self, proxy: PaymentProxy) -> Option<&PaymentProvider> {
        self.providers.iter().find(|p| p.active && p.proxy == proxy)
    }

    /// Methods the event allows through an active provider.
    ///
    /// # Errors
    ///
    /// Returns an error if the event cannot be loaded.
    pub fn available_methods(
        &self,
        store: &mut Store<'_>,
        event_id: i64,
    ) -> Result<Vec<PaymentMethod>, ServiceError> {
        self.methods_by_event.get_or_try_insert(event_id, || {
            let event = store.event(event_id)?;
            Ok(self.methods_for(&event))
        })
    }

    /// Drops the cached methods of an event.
    pub fn invalidate(&self, event_id: i64) {
        self.methods_by_event.invalidate(&event_id);
    }

    fn methods_for(&self, event: &Event) -> Vec<PaymentMethod> {
        let mut methods: Vec<PaymentMethod> = Vec::new();
        for provider in self
            .providers
            .iter()
            .filter(|p| p.active && event.allows_proxy(p.proxy))
        {
            for method in &provider.methods {
                if !methods.contains(method) {
                    methods.push(*method);
                }
            }
        }
        methods
    }

    /// Whether some allowed method is not blacklisted by any of `categories`.
    ///
    /// # Errors
    ///
    /// Returns an error if the event cannot be loaded.
    pub fn can_proceed(
        &self,
        store: &mut Store<'_>,
        event_id: i64,
        categories: &[TicketCategory],
    ) -> Result<bool, ServiceError> {
        let methods = self.available_methods(store, event_id)?;
        Ok(methods
            .iter()
            .any(|method| !categories.iter().any(|c| c.blacklists(*method))))
    }
}
