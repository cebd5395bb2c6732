//! Names of the storage-level unique and foreign-key constraints.
//!
//! The PostgreSQL schema declares these names explicitly and the in-memory
//! store reports the same ones, so callers can map a violation back to the
//! conflicting key regardless of backend.

pub const CUSTOMERS_EMAIL: &str = "customers_email_key";
pub const VEHICLES_VIN: &str = "vehicles_vin_key";
pub const VEHICLE_MODELS_IDENTITY: &str = "vehicle_models_brand_model_year_key";
pub const PART_CATEGORIES_NAME: &str = "part_categories_name_key";
pub const PARTS_SERIAL_NUMBER: &str = "parts_serial_number_key";
pub const WARRANTY_POLICIES_NAME: &str = "warranty_policies_name_key";
pub const COVERAGE_POLICY_CATEGORY: &str = "policy_coverage_parts_policy_category_key";

// Foreign keys. Every reference is `ON DELETE RESTRICT`.
pub const VEHICLES_CUSTOMER: &str = "vehicles_customer_id_fkey";
pub const VEHICLES_MODEL: &str = "vehicles_model_id_fkey";
pub const PART_CATEGORIES_PARENT: &str = "part_categories_parent_id_fkey";
pub const PARTS_CATEGORY: &str = "parts_category_id_fkey";
pub const COVERAGE_POLICY: &str = "policy_coverage_parts_policy_id_fkey";
pub const COVERAGE_CATEGORY: &str = "policy_coverage_parts_category_id_fkey";
