//! Checkout form validation.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Email;

/// Reasons a checkout cannot be submitted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckoutError {
    /// One or more fields are blank.
    #[error("All fields are required.")]
    MissingFields,
    /// The email does not look like an address.
    #[error("Please enter a valid email address.")]
    InvalidEmail,
    /// No auth token is available.
    #[error("Please log in to complete checkout.")]
    NotLoggedIn,
    /// The cart has no lines.
    #[error("Your cart is empty. Add items before checking out.")]
    EmptyCart,
}

/// Raw checkout form as submitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CheckoutForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub surname: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub zipcode: String,
}

/// Validated checkout details, in the shape the checkout endpoint expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckoutDetails {
    pub name: String,
    pub surname: String,
    pub email: Email,
    pub zip_code: String,
    pub address: String,
}

impl CheckoutForm {
    /// Trim every field and check it.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::MissingFields`] if any trimmed field is empty,
    /// then [`CheckoutError::InvalidEmail`] if the email is malformed.
    pub fn validate(&self) -> Result<CheckoutDetails, CheckoutError> {
        let name = self.name.trim();
        let surname = self.surname.trim();
        let email = self.email.trim();
        let address = self.address.trim();
        let zipcode = self.zipcode.trim();

        if [name, surname, email, address, zipcode]
            .iter()
            .any(|field| field.is_empty())
        {
            return Err(CheckoutError::MissingFields);
        }

        let email = Email::parse(email).map_err(|_| CheckoutError::InvalidEmail)?;

        Ok(CheckoutDetails {
            name: name.to_owned(),
            surname: surname.to_owned(),
            email,
            zip_code: zipcode.to_owned(),
            address: address.to_owned(),
        })
    }
}
