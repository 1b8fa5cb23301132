//! Web push delivery: subscription registry, fan-out dispatcher and the
//! push protocol transport.

mod dispatcher;
mod registry;
mod transport;

pub use dispatcher::{DispatchSummary, PushDispatcher, PushMessage, PushSettings};
pub use registry::{SubscriptionDescriptor, SubscriptionRegistry};
pub use transport::{PushTransport, WebPushTransport};
