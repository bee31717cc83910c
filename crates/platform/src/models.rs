use std::fmt;

use enum_map::Enum;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use time::OffsetDateTime;
use uuid::Uuid;

/// Feature modules of the admin platform.
///
/// The set is closed: dependency declarations, stats dimensions and config
/// defaults are all keyed by this enum so every table is checked for
/// exhaustiveness at compile time.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Enum,
)]
#[serde(rename_all = "camelCase")]
pub enum ModuleKey {
    Roles,
    Users,
    Categories,
    Posts,
    Comments,
    Menus,
    Notifications,
    Products,
    Customers,
    Orders,
    HomepageSections,
}

impl ModuleKey {
    pub const ALL: [ModuleKey; 11] = [
        ModuleKey::Roles,
        ModuleKey::Users,
        ModuleKey::Categories,
        ModuleKey::Posts,
        ModuleKey::Comments,
        ModuleKey::Menus,
        ModuleKey::Notifications,
        ModuleKey::Products,
        ModuleKey::Customers,
        ModuleKey::Orders,
        ModuleKey::HomepageSections,
    ];

    /// Returns the key used by the admin UI and stored in config rows.
    pub fn as_str(&self) -> &'static str {
        match self {
            ModuleKey::Roles => "roles",
            ModuleKey::Users => "users",
            ModuleKey::Categories => "categories",
            ModuleKey::Posts => "posts",
            ModuleKey::Comments => "comments",
            ModuleKey::Menus => "menus",
            ModuleKey::Notifications => "notifications",
            ModuleKey::Products => "products",
            ModuleKey::Customers => "customers",
            ModuleKey::Orders => "orders",
            ModuleKey::HomepageSections => "homepageSections",
        }
    }

    /// Parses a UI module key. Unknown keys yield `None`.
    pub fn parse(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|module| module.as_str() == key)
    }

    /// The collection holding this module's sample records.
    pub fn collection(&self) -> Collection {
        match self {
            ModuleKey::Roles => Collection::Roles,
            ModuleKey::Users => Collection::Users,
            ModuleKey::Categories => Collection::Categories,
            ModuleKey::Posts => Collection::Posts,
            ModuleKey::Comments => Collection::Comments,
            ModuleKey::Menus => Collection::Menus,
            ModuleKey::Notifications => Collection::Notifications,
            ModuleKey::Products => Collection::Products,
            ModuleKey::Customers => Collection::Customers,
            ModuleKey::Orders => Collection::Orders,
            ModuleKey::HomepageSections => Collection::HomepageSections,
        }
    }
}

impl fmt::Display for ModuleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named collections in the document store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Collection {
    Roles,
    Users,
    Categories,
    Posts,
    Comments,
    Menus,
    Notifications,
    Products,
    Customers,
    Orders,
    HomepageSections,
    ModuleFeatures,
    ModuleFields,
    ModuleSettings,
    ModuleStats,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Roles => "roles",
            Collection::Users => "users",
            Collection::Categories => "categories",
            Collection::Posts => "posts",
            Collection::Comments => "comments",
            Collection::Menus => "menus",
            Collection::Notifications => "notifications",
            Collection::Products => "products",
            Collection::Customers => "customers",
            Collection::Orders => "orders",
            Collection::HomepageSections => "homepageSections",
            Collection::ModuleFeatures => "moduleFeatures",
            Collection::ModuleFields => "moduleFields",
            Collection::ModuleSettings => "moduleSettings",
            Collection::ModuleStats => "moduleStats",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed record stored as a document in a fixed collection.
pub trait Record: Serialize + DeserializeOwned + Send + Sync {
    const COLLECTION: Collection;
}

macro_rules! impl_record {
    ($($ty:ty => $collection:ident),* $(,)?) => {
        $(impl Record for $ty {
            const COLLECTION: Collection = Collection::$collection;
        })*
    };
}

impl_record! {
    Role => Roles,
    User => Users,
    Category => Categories,
    Post => Posts,
    Comment => Comments,
    Menu => Menus,
    Notification => Notifications,
    Product => Products,
    Customer => Customers,
    Order => Orders,
    HomepageSection => HomepageSections,
    ModuleFeature => ModuleFeatures,
    ModuleField => ModuleFields,
    ModuleSetting => ModuleSettings,
    StatCounter => ModuleStats,
}

// ---------------------------------------------------------------------------
// Users and access control
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    pub name: String,
    pub slug: String,
    pub description: String,
    pub permissions: Vec<String>,
    pub is_system: bool,
    #[serde(default)]
    pub user_count: u32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    Active,
    Inactive,
    Suspended,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub name: String,
    pub email: String,
    pub role_id: Uuid,
    pub status: UserStatus,
    pub phone: Option<String>,
    pub city: Option<String>,
    pub joined_at: OffsetDateTime,
}

// ---------------------------------------------------------------------------
// Content
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    #[serde(default)]
    pub post_count: u32,
    #[serde(default)]
    pub product_count: u32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Published,
    Draft,
    Archived,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub title: String,
    pub slug: String,
    pub excerpt: String,
    pub body: String,
    pub author_id: Uuid,
    pub category_id: Option<Uuid>,
    pub status: PostStatus,
    pub tags: Vec<String>,
    pub view_count: u32,
    #[serde(default)]
    pub comment_count: u32,
    pub published_at: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CommentStatus {
    Approved,
    Pending,
    Spam,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub post_id: Uuid,
    /// Registered author; guest comments only carry name and email.
    pub author_id: Option<Uuid>,
    pub author_name: String,
    pub author_email: String,
    pub content: String,
    pub status: CommentStatus,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MenuLocation {
    Header,
    Footer,
    Sidebar,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    pub label: String,
    pub url: String,
    pub position: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Menu {
    pub name: String,
    pub location: MenuLocation,
    pub items: Vec<MenuItem>,
    pub is_active: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub user_id: Uuid,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub read: bool,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SectionKind {
    Hero,
    FeaturedProducts,
    LatestPosts,
    Newsletter,
    Testimonials,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HomepageSection {
    pub title: String,
    pub kind: SectionKind,
    pub position: u32,
    pub visible: bool,
    /// Products or posts featured by the section, depending on `kind`.
    pub item_ids: Vec<Uuid>,
}

// ---------------------------------------------------------------------------
// Commerce
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ProductStatus {
    Active,
    Draft,
    OutOfStock,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub name: String,
    pub sku: String,
    pub description: String,
    pub price_cents: i64,
    pub stock: u32,
    pub category_id: Option<Uuid>,
    pub status: ProductStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub street: String,
    pub city: String,
    pub postcode: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: Address,
    #[serde(default)]
    pub order_count: u32,
    #[serde(default)]
    pub total_spent_cents: i64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub product_id: Uuid,
    pub quantity: u32,
    pub unit_price_cents: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub customer_id: Uuid,
    pub lines: Vec<OrderLine>,
    pub total_cents: i64,
    pub status: OrderStatus,
    pub placed_at: OffsetDateTime,
}

impl Order {
    /// Sum of line totals. Stored orders must carry exactly this total.
    pub fn lines_total(&self) -> i64 {
        self.lines
            .iter()
            .map(|line| line.unit_price_cents * i64::from(line.quantity))
            .sum()
    }
}

// ---------------------------------------------------------------------------
// Module config triple
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum FieldType {
    Text,
    RichText,
    Number,
    Boolean,
    Select,
    Date,
    Reference,
    Image,
}

/// A toggleable feature of a module, optionally linked to the field it shows.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ModuleFeature {
    pub module_key: ModuleKey,
    pub feature_key: String,
    pub name: String,
    pub enabled: bool,
    pub linked_field_key: Option<String>,
}

/// One entry of a module's field schema.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ModuleField {
    pub module_key: ModuleKey,
    pub field_key: String,
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub enabled: bool,
    pub required: bool,
    pub is_system: bool,
    pub linked_feature: Option<String>,
    pub order: u32,
}

/// Value of a module setting.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum SettingValue {
    Text(String),
    Number(f64),
    Boolean(bool),
    /// Arrays or objects, e.g. a list of allowed values.
    Structured(serde_json::Value),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ModuleSetting {
    pub module_key: ModuleKey,
    pub setting_key: String,
    pub value: SettingValue,
}

/// Derived per-dimension counter kept alongside a module's primary data.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StatCounter {
    pub module_key: ModuleKey,
    pub key: String,
    pub count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_key_round_trips_through_ui_key() {
        for module in ModuleKey::ALL {
            assert_eq!(ModuleKey::parse(module.as_str()), Some(module));
        }
        assert_eq!(ModuleKey::parse("checkout"), None);
    }

    #[test]
    fn test_module_key_serializes_like_ui_key() {
        let json = serde_json::to_string(&ModuleKey::HomepageSections).unwrap();
        assert_eq!(json, "\"homepageSections\"");
    }

    #[test]
    fn test_setting_value_is_tagged() {
        let value = serde_json::to_value(SettingValue::Boolean(true)).unwrap();
        assert_eq!(value, serde_json::json!({"type": "boolean", "value": true}));
    }

    #[test]
    fn test_order_lines_total() {
        let order = Order {
            customer_id: Uuid::new_v4(),
            lines: vec![
                OrderLine {
                    product_id: Uuid::new_v4(),
                    quantity: 2,
                    unit_price_cents: 1250,
                },
                OrderLine {
                    product_id: Uuid::new_v4(),
                    quantity: 1,
                    unit_price_cents: 499,
                },
            ],
            total_cents: 2999,
            status: OrderStatus::Pending,
            placed_at: OffsetDateTime::now_utc(),
        };
        assert_eq!(order.lines_total(), 2999);
    }
}
