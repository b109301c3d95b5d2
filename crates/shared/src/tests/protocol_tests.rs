use serde_json::json;
use uuid::Uuid;

use crate::{
    domain::{ShopProfile, ShopProfileId, UserId},
    error::ErrorCode,
    optional::OptionalVariable,
    protocol::*,
};

fn mechanic() -> UserId {
    UserId(Uuid::nil())
}

#[test]
fn omitted_optionals_are_left_out_of_payload() {
    let vars = InsertPartRequestVariables::new(mechanic(), "brake pads", "Toyota", "Camry", 2018);
    let value = serde_json::to_value(&vars).expect("json");
    let object = value.as_object().expect("object");

    assert!(!object.contains_key("VIN"));
    assert!(!object.contains_key("urgency"));
    assert_eq!(object["vehicleMake"], "Toyota");
    assert_eq!(object["vehicleModel"], "Camry");
    assert_eq!(object["vehicleYear"], 2018);
    assert_eq!(object["partDescription"], "brake pads");
}

#[test]
fn explicit_null_is_sent_as_null() {
    let vars = InsertPartRequestVariables::new(mechanic(), "brake pads", "Toyota", "Camry", 2018)
        .vin(None)
        .urgency(Some("today".into()));
    let value = serde_json::to_value(&vars).expect("json");

    assert_eq!(value["VIN"], serde_json::Value::Null);
    assert!(value.as_object().expect("object").contains_key("VIN"));
    assert_eq!(value["urgency"], "today");
}

#[test]
fn deserializing_keeps_three_states_apart() {
    let absent: CreateShopProfileVariables = serde_json::from_value(json!({
        "userId": Uuid::nil(),
        "primaryContactPerson": "Dana",
        "shopName": "AutoParts Plus",
    }))
    .expect("absent");
    assert_eq!(absent.delivery_options, OptionalVariable::Undefined);

    let null: CreateShopProfileVariables = serde_json::from_value(json!({
        "userId": Uuid::nil(),
        "deliveryOptions": null,
        "primaryContactPerson": "Dana",
        "shopName": "AutoParts Plus",
    }))
    .expect("null");
    assert_eq!(null.delivery_options, OptionalVariable::Null);

    let empty: CreateShopProfileVariables = serde_json::from_value(json!({
        "userId": Uuid::nil(),
        "deliveryOptions": [],
        "primaryContactPerson": "Dana",
        "shopName": "AutoParts Plus",
    }))
    .expect("empty");
    assert_eq!(empty.delivery_options, OptionalVariable::Value(Vec::new()));
}

#[test]
fn validation_rejects_blank_required_fields() {
    let err = InsertPartRequestVariables::new(mechanic(), "brake pads", "  ", "Camry", 2018)
        .validate()
        .expect_err("blank make");
    assert_eq!(err.code, ErrorCode::Validation);
    assert!(err.message.contains("vehicleMake"));

    let err = CreateShopProfileVariables::new(mechanic(), "Dana", "")
        .validate()
        .expect_err("blank shop name");
    assert!(err.message.contains("shopName"));
}

#[test]
fn insert_data_uses_backend_field_names() {
    let data: InsertPartRequestData = serde_json::from_value(json!({
        "partRequest_insert": { "id": Uuid::nil() }
    }))
    .expect("data");
    assert_eq!(data.key.id.0, Uuid::nil());
}

#[test]
fn shop_profile_without_lists_round_trips_as_absent() {
    let profile = ShopProfile {
        id: ShopProfileId(Uuid::nil()),
        user_id: mechanic(),
        delivery_options: None,
        inventory_specialties: Some(vec!["brakes".into()]),
        primary_contact_person: "Dana".into(),
        shop_name: "AutoParts Plus".into(),
    };
    let value = serde_json::to_value(&profile).expect("json");
    assert!(value.get("deliveryOptions").is_none());
    assert_eq!(value["inventorySpecialties"], json!(["brakes"]));
}

#[test]
fn operation_kinds_are_registered_by_name() {
    assert_eq!(
        operation_kind("InsertPartRequest"),
        Some(OperationKind::Mutation)
    );
    assert_eq!(operation_kind("ListShopProfiles"), Some(OperationKind::Query));
    assert_eq!(operation_kind("DeletePartRequest"), None);
}

#[test]
fn execute_path_follows_connector_config() {
    let config = ConnectorConfig::default();
    assert_eq!(
        config.execute_path(OperationKind::Query),
        "/services/app/connectors/example/executeQuery"
    );
}

#[test]
fn request_without_variables_omits_the_field() {
    let request = OperationRequest {
        operation_name: ListShopProfiles::NAME.into(),
        variables: serde_json::Value::Null,
    };
    let value = serde_json::to_value(&request).expect("json");
    assert_eq!(value, json!({ "operationName": "ListShopProfiles" }));
}
