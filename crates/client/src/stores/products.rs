//! Products slice: the catalog as last loaded from the REST API.
//!
//! Each API operation tracks its own request status and error so that a
//! failed delete does not hide a successful list load. The async helpers at
//! the bottom dispatch `*Pending`, then `*Fulfilled` or `*Rejected`.

use stockroom_shared::{ApiError, Product, ProductDraft};

use super::{Action, StoreHandle};
use crate::api_client::ApiClient;

/// Request status for one API operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestStatus {
    #[default]
    Idle,
    Loading,
    Succeeded,
    Failed,
}

/// Per-operation bookkeeping.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Operations<T> {
    pub get_all: T,
    pub get_one: T,
    pub add_one: T,
    pub update_one: T,
    pub delete_one: T,
}

/// Which API operation an action refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductOp {
    GetAll,
    GetOne,
    AddOne,
    UpdateOne,
    DeleteOne,
}

impl<T> Operations<T> {
    fn get_mut(&mut self, op: ProductOp) -> &mut T {
        match op {
            ProductOp::GetAll => &mut self.get_all,
            ProductOp::GetOne => &mut self.get_one,
            ProductOp::AddOne => &mut self.add_one,
            ProductOp::UpdateOne => &mut self.update_one,
            ProductOp::DeleteOne => &mut self.delete_one,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProductsAction {
    Pending(ProductOp),
    Rejected { op: ProductOp, error: String },
    FetchAllFulfilled(Vec<Product>),
    FetchOneFulfilled(Product),
    AddFulfilled(Product),
    UpdateFulfilled(Product),
    DeleteFulfilled { product_id: i64 },
    /// Put the list and detail loads back to idle and clear the selection.
    ResetStatus,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProductsState {
    pub items: Vec<Product>,
    pub status: Operations<RequestStatus>,
    pub error: Operations<Option<String>>,
    pub selected_product: Option<Product>,
}

impl ProductsState {
    pub fn find(&self, product_id: i64) -> Option<&Product> {
        self.items.iter().find(|p| p.product_id == product_id)
    }
}

pub fn reduce(state: &mut ProductsState, action: &ProductsAction) {
    match action {
        ProductsAction::Pending(op) => {
            *state.status.get_mut(*op) = RequestStatus::Loading;
            *state.error.get_mut(*op) = None;
        }
        ProductsAction::Rejected { op, error } => {
            *state.status.get_mut(*op) = RequestStatus::Failed;
            *state.error.get_mut(*op) = Some(error.clone());
        }
        ProductsAction::FetchAllFulfilled(items) => {
            state.status.get_all = RequestStatus::Succeeded;
            state.items = items.clone();
        }
        ProductsAction::FetchOneFulfilled(product) => {
            state.status.get_one = RequestStatus::Succeeded;
            state.selected_product = Some(product.clone());
        }
        ProductsAction::AddFulfilled(product) => {
            state.status.add_one = RequestStatus::Succeeded;
            state.items.push(product.clone());
        }
        ProductsAction::UpdateFulfilled(product) => {
            state.status.update_one = RequestStatus::Succeeded;
            if let Some(existing) = state
                .items
                .iter_mut()
                .find(|p| p.product_id == product.product_id)
            {
                *existing = product.clone();
            }
        }
        ProductsAction::DeleteFulfilled { product_id } => {
            state.status.delete_one = RequestStatus::Succeeded;
            state.items.retain(|p| p.product_id != *product_id);
        }
        ProductsAction::ResetStatus => {
            state.status.get_all = RequestStatus::Idle;
            state.status.get_one = RequestStatus::Idle;
            state.selected_product = None;
        }
    }
}

// --- Async API helpers ---

fn dispatch(store: &StoreHandle, action: ProductsAction) {
    store.dispatch(Action::Products(action));
}

fn settle<T>(
    store: &StoreHandle,
    op: ProductOp,
    result: Result<T, ApiError>,
    fulfilled: impl FnOnce(T) -> ProductsAction,
) -> Result<(), ApiError> {
    match result {
        Ok(value) => {
            dispatch(store, fulfilled(value));
            Ok(())
        }
        Err(e) => {
            crate::log_error!("Product request {:?} failed: {}", op, e);
            dispatch(
                store,
                ProductsAction::Rejected {
                    op,
                    error: e.user_message(),
                },
            );
            Err(e)
        }
    }
}

/// Load the whole catalog into the slice.
pub async fn fetch_all_products(api: &ApiClient, store: &StoreHandle) -> Result<(), ApiError> {
    dispatch(store, ProductsAction::Pending(ProductOp::GetAll));
    let result = api.list_products().await;
    settle(store, ProductOp::GetAll, result, ProductsAction::FetchAllFulfilled)
}

/// Load one product into `selected_product`.
pub async fn fetch_product(
    api: &ApiClient,
    store: &StoreHandle,
    product_id: i64,
) -> Result<(), ApiError> {
    dispatch(store, ProductsAction::Pending(ProductOp::GetOne));
    let result = api.get_product(product_id).await;
    settle(store, ProductOp::GetOne, result, ProductsAction::FetchOneFulfilled)
}

/// Create a product and append it to the list.
pub async fn add_product(
    api: &ApiClient,
    store: &StoreHandle,
    draft: &ProductDraft,
) -> Result<(), ApiError> {
    dispatch(store, ProductsAction::Pending(ProductOp::AddOne));
    let result = api.create_product(draft).await;
    settle(store, ProductOp::AddOne, result, ProductsAction::AddFulfilled)
}

/// Update a product and replace it in the list.
pub async fn update_product(
    api: &ApiClient,
    store: &StoreHandle,
    product_id: i64,
    draft: &ProductDraft,
) -> Result<(), ApiError> {
    dispatch(store, ProductsAction::Pending(ProductOp::UpdateOne));
    let result = api.update_product(product_id, draft).await;
    settle(store, ProductOp::UpdateOne, result, ProductsAction::UpdateFulfilled)
}

/// Delete a product and drop it from the list.
pub async fn delete_product(
    api: &ApiClient,
    store: &StoreHandle,
    product_id: i64,
) -> Result<(), ApiError> {
    dispatch(store, ProductsAction::Pending(ProductOp::DeleteOne));
    let result = api.delete_product(product_id).await;
    settle(store, ProductOp::DeleteOne, result, |()| {
        ProductsAction::DeleteFulfilled { product_id }
    })
}
