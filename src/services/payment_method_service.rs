use uuid::Uuid;

use super::ServiceError;
use crate::database::models::{PaymentMethod, PaymentMethodInput};
use crate::database::Store;

pub struct PaymentMethodService<'a> {
    store: &'a dyn Store,
}

impl<'a> PaymentMethodService<'a> {
    pub fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// Users only ever see visible methods; admins see all of them
    pub async fn list(&self, visible_only: bool) -> Result<Vec<PaymentMethod>, ServiceError> {
        Ok(self.store.list_payment_methods(visible_only).await?)
    }

    pub async fn create(&self, input: PaymentMethodInput) -> Result<PaymentMethod, ServiceError> {
        let input = validate_payment_method(input)?;
        let method = self.store.insert_payment_method(input).await?;
        tracing::info!("Payment method {} ({}) created", method.id, method.label);
        Ok(method)
    }

    pub async fn update(&self, id: Uuid, input: PaymentMethodInput) -> Result<PaymentMethod, ServiceError> {
        let input = validate_payment_method(input)?;
        Ok(self.store.update_payment_method(id, input).await?)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        self.store.delete_payment_method(id).await?;
        tracing::info!("Payment method {} deleted", id);
        Ok(())
    }
}

fn validate_payment_method(mut input: PaymentMethodInput) -> Result<PaymentMethodInput, ServiceError> {
    input.method_type = input.method_type.trim().to_lowercase();
    input.label = input.label.trim().to_string();
    if input.method_type.is_empty() {
        return Err(ServiceError::invalid("method_type", "Payment method type is required"));
    }
    if input.label.is_empty() {
        return Err(ServiceError::invalid("label", "Label is required"));
    }
    if input.is_default && !input.is_visible {
        return Err(ServiceError::invalid("is_default", "A hidden payment method cannot be the default"));
    }
    input.qr_image_path = input
        .qr_image_path
        .map(|p| p.trim().trim_start_matches('/').to_string())
        .filter(|p| !p.is_empty());
    Ok(input)
}
