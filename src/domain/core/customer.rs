use derive_more::{Deref, Display, Error, From};
use serde::{Deserialize, Serialize};

use crate::domain::Id;

/// Renter number assigned by the caller.
#[derive(
    Copy,
    Clone,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    From,
    Deref,
    Default,
)]
pub struct CustomerId(u64);

impl Id for CustomerId {
    type Inner = u64;
}

/// The renter. Reservations keep their own copy.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    id: CustomerId,
    name: String,
    contact_info: String,
    license_number: String,
}

impl Customer {
    pub fn create(
        id: CustomerId,
        name: String,
        contact_info: String,
        license_number: String,
    ) -> Result<Self, CustomerError> {
        if name.trim().is_empty() {
            return Err(CustomerError::NameIsBlank);
        }
        if license_number.trim().is_empty() {
            return Err(CustomerError::LicenseIsBlank);
        }
        Ok(Self {
            id,
            name,
            contact_info,
            license_number,
        })
    }

    pub fn id(&self) -> CustomerId {
        self.id
    }

    /// Full name as printed on the licence.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Free-form phone number or e-mail address.
    pub fn contact_info(&self) -> &str {
        &self.contact_info
    }

    /// Driver's licence number.
    pub fn license_number(&self) -> &str {
        &self.license_number
    }
}

#[derive(Error, Display, Debug)]
pub enum CustomerError {
    /// Name is empty or whitespace.
    #[display(fmt = "Customer name cannot be blank")]
    NameIsBlank,
    /// Licence number is empty or whitespace.
    #[display(fmt = "Driver's license number cannot be blank")]
    LicenseIsBlank,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_customer_create() {
        let customer = Customer::create(
            CustomerId::from(1),
            "John Doe".to_owned(),
            "john@example.com".to_owned(),
            "DL1234".to_owned(),
        )
        .unwrap();
        assert_eq!(customer.id(), CustomerId::from(1));
        assert_eq!(customer.name(), "John Doe");
        assert_eq!(customer.contact_info(), "john@example.com");
        assert_eq!(customer.license_number(), "DL1234");
    }

    #[test]
    fn test_customer_blank_fields() {
        let err = Customer::create(1.into(), " ".to_owned(), String::new(), "DL1".to_owned());
        assert!(matches!(err, Err(CustomerError::NameIsBlank)));
        let err = Customer::create(1.into(), "Jane".to_owned(), String::new(), "".to_owned());
        assert!(matches!(err, Err(CustomerError::LicenseIsBlank)));
    }
}
