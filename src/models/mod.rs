pub mod animal;
pub mod health_record;
pub mod lifetime_slot;
pub mod payment;
pub mod user;
