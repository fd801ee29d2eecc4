//! donor-portal/crates/dp-core/src/lib.rs
//!
//! Domain models and interface definitions shared by the donor portal screens.

pub mod credential;
pub mod error;
pub mod models;
pub mod traits;

// Re-exporting for easier access in other crates
pub use credential::*;
pub use error::*;
pub use models::*;
pub use traits::*;

#[cfg(test)]
mod tests {
    use super::models::*;

    #[test]
    fn test_charity_from_backend_json() {
        let charity: Charity = serde_json::from_value(serde_json::json!({
            "id": 42,
            "name": "River Trust",
            "category": "environment",
            "total_received": 1250.5
        }))
        .unwrap();
        assert_eq!(charity.id, 42);
        assert_eq!(charity.region, None);
        assert!(!charity.verified);
    }
}
