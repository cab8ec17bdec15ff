use sea_orm::entity::prelude::*;

/// A rate row scoped to a (method, zone) pair. The cart's weight formula
/// reads the `weight` rows with bounds [0, 1) and [1, unbounded).
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "shipping_rates")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: Uuid,
    pub shipping_method_id: Uuid,
    pub shipping_zone_id: Uuid,
    pub calculation_type: String,
    pub flat_rate: Decimal,
    pub min_weight: Option<Decimal>,
    pub max_weight: Option<Decimal>,
    pub rate_per_kg: Option<Decimal>,
    pub min_order_value: Option<Decimal>,
    pub max_order_value: Option<Decimal>,
    pub free_shipping_over: Option<Decimal>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::shipping_methods::Entity",
        from = "Column::ShippingMethodId",
        to = "super::shipping_methods::Column::Id"
    )]
    ShippingMethods,
    #[sea_orm(
        belongs_to = "super::shipping_zones::Entity",
        from = "Column::ShippingZoneId",
        to = "super::shipping_zones::Column::Id"
    )]
    ShippingZones,
}

impl Related<super::shipping_methods::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ShippingMethods.def()
    }
}

impl Related<super::shipping_zones::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ShippingZones.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
