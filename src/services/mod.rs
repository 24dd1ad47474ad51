pub mod email;
pub mod observations;
pub mod store;

pub use email::{EmailService, NotifyError};
pub use observations::{Observation, ObservationLog};
pub use store::{PriceStore, StoreError};

use async_trait::async_trait;

/// Where price mails go. Implemented over SMTP by [`EmailService`].
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn price_changed(&self, old_price: Option<f64>, new_price: f64) -> Result<(), NotifyError>;

    /// One-shot report of the current price, sent regardless of change.
    async fn current_price(&self, price: f64) -> Result<(), NotifyError>;
}

#[async_trait]
impl Notifier for EmailService {
    async fn price_changed(&self, old_price: Option<f64>, new_price: f64) -> Result<(), NotifyError> {
        self.send_price_change(old_price, new_price).await
    }

    async fn current_price(&self, price: f64) -> Result<(), NotifyError> {
        self.send_current_price(price).await
    }
}
