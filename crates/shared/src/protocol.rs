use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

use crate::{
    domain::{PartRequest, PartRequestId, ShopProfile, ShopProfileId, UserId},
    error::{require_non_empty, ApiError},
    optional::OptionalVariable,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectorConfig {
    pub connector: String,
    pub service: String,
    pub location: String,
}

impl Default for ConnectorConfig {
    fn default() -> Self {
        Self {
            connector: "example".into(),
            service: "app".into(),
            location: "us-central1".into(),
        }
    }
}

impl ConnectorConfig {
    pub fn execute_path(&self, kind: OperationKind) -> String {
        format!(
            "/services/{}/connectors/{}/{}",
            self.service,
            self.connector,
            kind.endpoint()
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Query,
    Mutation,
}

impl OperationKind {
    pub fn endpoint(self) -> &'static str {
        match self {
            OperationKind::Query => "executeQuery",
            OperationKind::Mutation => "executeMutation",
        }
    }
}

/// A named backend operation with fixed variable and result shapes.
pub trait Operation {
    const NAME: &'static str;
    const KIND: OperationKind;
    type Variables: Serialize + DeserializeOwned + Send + Sync;
    type Data: Serialize + DeserializeOwned + Send;
}

/// Marker for operations that only read, and so may be re-run freely.
pub trait Query: Operation {}

pub struct InsertPartRequest;
pub struct GetPartRequestsByMechanic;
pub struct CreateShopProfile;
pub struct ListShopProfiles;

impl Operation for InsertPartRequest {
    const NAME: &'static str = "InsertPartRequest";
    const KIND: OperationKind = OperationKind::Mutation;
    type Variables = InsertPartRequestVariables;
    type Data = InsertPartRequestData;
}

impl Operation for GetPartRequestsByMechanic {
    const NAME: &'static str = "GetPartRequestsByMechanic";
    const KIND: OperationKind = OperationKind::Query;
    type Variables = GetPartRequestsByMechanicVariables;
    type Data = GetPartRequestsByMechanicData;
}

impl Operation for CreateShopProfile {
    const NAME: &'static str = "CreateShopProfile";
    const KIND: OperationKind = OperationKind::Mutation;
    type Variables = CreateShopProfileVariables;
    type Data = CreateShopProfileData;
}

impl Operation for ListShopProfiles {
    const NAME: &'static str = "ListShopProfiles";
    const KIND: OperationKind = OperationKind::Query;
    type Variables = ListShopProfilesVariables;
    type Data = ListShopProfilesData;
}

impl Query for GetPartRequestsByMechanic {}
impl Query for ListShopProfiles {}

/// Every operation name the backend answers to, with its kind.
pub const OPERATIONS: [(&str, OperationKind); 4] = [
    (InsertPartRequest::NAME, InsertPartRequest::KIND),
    (GetPartRequestsByMechanic::NAME, GetPartRequestsByMechanic::KIND),
    (CreateShopProfile::NAME, CreateShopProfile::KIND),
    (ListShopProfiles::NAME, ListShopProfiles::KIND),
];

pub fn operation_kind(name: &str) -> Option<OperationKind> {
    OPERATIONS
        .iter()
        .find(|(candidate, _)| *candidate == name)
        .map(|(_, kind)| *kind)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertPartRequestVariables {
    pub mechanic_id: UserId,
    #[serde(
        rename = "VIN",
        default,
        skip_serializing_if = "OptionalVariable::is_undefined"
    )]
    pub vin: OptionalVariable<String>,
    pub part_description: String,
    #[serde(default, skip_serializing_if = "OptionalVariable::is_undefined")]
    pub urgency: OptionalVariable<String>,
    pub vehicle_make: String,
    pub vehicle_model: String,
    pub vehicle_year: i32,
}

impl InsertPartRequestVariables {
    pub fn new(
        mechanic_id: UserId,
        part_description: impl Into<String>,
        vehicle_make: impl Into<String>,
        vehicle_model: impl Into<String>,
        vehicle_year: i32,
    ) -> Self {
        Self {
            mechanic_id,
            vin: OptionalVariable::Undefined,
            part_description: part_description.into(),
            urgency: OptionalVariable::Undefined,
            vehicle_make: vehicle_make.into(),
            vehicle_model: vehicle_model.into(),
            vehicle_year,
        }
    }

    /// `None` sends an explicit null.
    pub fn vin(mut self, vin: Option<String>) -> Self {
        self.vin = vin.into();
        self
    }

    /// `None` sends an explicit null.
    pub fn urgency(mut self, urgency: Option<String>) -> Self {
        self.urgency = urgency.into();
        self
    }

    pub fn validate(&self) -> Result<(), ApiError> {
        require_non_empty("vehicleMake", &self.vehicle_make)?;
        require_non_empty("vehicleModel", &self.vehicle_model)?;
        require_non_empty("partDescription", &self.part_description)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartRequestKey {
    pub id: PartRequestId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsertPartRequestData {
    #[serde(rename = "partRequest_insert")]
    pub key: PartRequestKey,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetPartRequestsByMechanicVariables {
    pub mechanic_id: UserId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetPartRequestsByMechanicData {
    pub part_requests: Vec<PartRequest>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateShopProfileVariables {
    pub user_id: UserId,
    #[serde(default, skip_serializing_if = "OptionalVariable::is_undefined")]
    pub delivery_options: OptionalVariable<Vec<String>>,
    #[serde(default, skip_serializing_if = "OptionalVariable::is_undefined")]
    pub inventory_specialties: OptionalVariable<Vec<String>>,
    pub primary_contact_person: String,
    pub shop_name: String,
}

impl CreateShopProfileVariables {
    pub fn new(
        user_id: UserId,
        primary_contact_person: impl Into<String>,
        shop_name: impl Into<String>,
    ) -> Self {
        Self {
            user_id,
            delivery_options: OptionalVariable::Undefined,
            inventory_specialties: OptionalVariable::Undefined,
            primary_contact_person: primary_contact_person.into(),
            shop_name: shop_name.into(),
        }
    }

    pub fn delivery_options(mut self, options: Option<Vec<String>>) -> Self {
        self.delivery_options = options.into();
        self
    }

    pub fn inventory_specialties(mut self, specialties: Option<Vec<String>>) -> Self {
        self.inventory_specialties = specialties.into();
        self
    }

    pub fn validate(&self) -> Result<(), ApiError> {
        require_non_empty("primaryContactPerson", &self.primary_contact_person)?;
        require_non_empty("shopName", &self.shop_name)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopProfileKey {
    pub id: ShopProfileId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateShopProfileData {
    #[serde(rename = "shopProfile_insert")]
    pub key: ShopProfileKey,
}

/// Takes no input; accepts an absent, null or empty variables object.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListShopProfilesVariables {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListShopProfilesData {
    pub shop_profiles: Vec<ShopProfile>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationRequest {
    pub operation_name: String,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub variables: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationResponse<D> {
    pub data: D,
}
