//! Application state store.
//!
//! State is split into named slices; each slice has its own action type and
//! reducer. Nothing outside the store task mutates state: callers dispatch
//! [`Action`]s through a [`StoreHandle`] and read snapshots back.

pub mod products;
pub mod realtime;
pub mod store;

pub use products::{
    add_product, delete_product, fetch_all_products, fetch_product, update_product, Operations,
    ProductOp, ProductsAction, ProductsState, RequestStatus,
};
pub use realtime::{RealtimeAction, RealtimeState, RealtimeStatus};
pub use store::{Dispatcher, Flow, Middleware, Store, StoreHandle};

/// Every action the store understands, tagged by slice.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Realtime(RealtimeAction),
    Products(ProductsAction),
}

impl From<RealtimeAction> for Action {
    fn from(action: RealtimeAction) -> Self {
        Action::Realtime(action)
    }
}

impl From<ProductsAction> for Action {
    fn from(action: ProductsAction) -> Self {
        Action::Products(action)
    }
}

/// The whole application state.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppState {
    pub realtime: RealtimeState,
    pub products: ProductsState,
}

impl AppState {
    /// Initial state keeping at most `message_history` inbound messages.
    pub fn new(message_history: usize) -> Self {
        Self {
            realtime: RealtimeState::with_history(message_history),
            products: ProductsState::default(),
        }
    }
}

/// Root reducer.
pub fn reduce(state: &mut AppState, action: &Action) {
    match action {
        Action::Realtime(action) => realtime::reduce(&mut state.realtime, action),
        Action::Products(action) => products::reduce(&mut state.products, action),
    }
}
