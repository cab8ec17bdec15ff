pub mod addresses;
pub mod audit_logs;
pub mod cart_items;
pub mod carts;
pub mod districts;
pub mod order_items;
pub mod order_status_history;
pub mod orders;
pub mod product_variants;
pub mod products;
pub mod shipping_methods;
pub mod shipping_rates;
pub mod shipping_zones;
pub mod users;

pub use addresses::Entity as Addresses;
pub use audit_logs::Entity as AuditLogs;
pub use cart_items::Entity as CartItems;
pub use carts::Entity as Carts;
pub use districts::Entity as Districts;
pub use order_items::Entity as OrderItems;
pub use order_status_history::Entity as OrderStatusHistory;
pub use orders::Entity as Orders;
pub use product_variants::Entity as ProductVariants;
pub use products::Entity as Products;
pub use shipping_methods::Entity as ShippingMethods;
pub use shipping_rates::Entity as ShippingRates;
pub use shipping_zones::Entity as ShippingZones;
pub use users::Entity as Users;
