use serde::Serialize;
use serde_json::Value;
use shared::{
    error::{ApiError, ErrorCode},
    protocol::{
        operation_kind, CreateShopProfile, CreateShopProfileData, CreateShopProfileVariables,
        GetPartRequestsByMechanic, GetPartRequestsByMechanicData,
        GetPartRequestsByMechanicVariables, InsertPartRequest, InsertPartRequestData,
        InsertPartRequestVariables, ListShopProfiles, ListShopProfilesData, Operation,
        OperationKind, OperationRequest, PartRequestKey, ShopProfileKey,
    },
};
use storage::{NewPartRequest, NewShopProfile, Storage};
use tracing::{info, warn};

#[derive(Clone)]
pub struct ApiContext {
    pub storage: Storage,
}

pub async fn insert_part_request(
    ctx: &ApiContext,
    vars: InsertPartRequestVariables,
) -> Result<InsertPartRequestData, ApiError> {
    vars.validate()?;
    let id = ctx
        .storage
        .insert_part_request(&NewPartRequest {
            mechanic_id: vars.mechanic_id,
            vin: vars.vin.into_option(),
            part_description: vars.part_description,
            urgency: vars.urgency.into_option(),
            vehicle_make: vars.vehicle_make,
            vehicle_model: vars.vehicle_model,
            vehicle_year: vars.vehicle_year,
        })
        .await
        .map_err(internal)?;
    info!(part_request_id = %id, mechanic_id = %vars.mechanic_id, "part request inserted");
    Ok(InsertPartRequestData {
        key: PartRequestKey { id },
    })
}

pub async fn get_part_requests_by_mechanic(
    ctx: &ApiContext,
    vars: GetPartRequestsByMechanicVariables,
) -> Result<GetPartRequestsByMechanicData, ApiError> {
    let part_requests = ctx
        .storage
        .list_part_requests_for_mechanic(vars.mechanic_id)
        .await
        .map_err(internal)?;
    Ok(GetPartRequestsByMechanicData { part_requests })
}

pub async fn create_shop_profile(
    ctx: &ApiContext,
    vars: CreateShopProfileVariables,
) -> Result<CreateShopProfileData, ApiError> {
    vars.validate()?;
    let id = ctx
        .storage
        .insert_shop_profile(&NewShopProfile {
            user_id: vars.user_id,
            delivery_options: vars.delivery_options.into_option(),
            inventory_specialties: vars.inventory_specialties.into_option(),
            primary_contact_person: vars.primary_contact_person,
            shop_name: vars.shop_name,
        })
        .await
        .map_err(internal)?;
    info!(shop_profile_id = %id, user_id = %vars.user_id, "shop profile created");
    Ok(CreateShopProfileData {
        key: ShopProfileKey { id },
    })
}

pub async fn list_shop_profiles(ctx: &ApiContext) -> Result<ListShopProfilesData, ApiError> {
    let shop_profiles = ctx.storage.list_shop_profiles().await.map_err(internal)?;
    Ok(ListShopProfilesData { shop_profiles })
}

/// Runs the named operation, rejecting names that are unknown or posted to
/// the wrong endpoint kind.
pub async fn execute_operation(
    ctx: &ApiContext,
    kind: OperationKind,
    request: OperationRequest,
) -> Result<Value, ApiError> {
    let name = request.operation_name.as_str();
    let Some(expected) = operation_kind(name) else {
        warn!(operation = name, "unknown operation");
        return Err(ApiError::not_found(format!("unknown operation {name}")));
    };
    if expected != kind {
        return Err(ApiError::validation(format!(
            "{name} is a {expected:?} and cannot be run through {}",
            kind.endpoint()
        )));
    }

    let variables = request.variables;
    if name == InsertPartRequest::NAME {
        let vars = decode_variables::<InsertPartRequest>(variables)?;
        encode_data(insert_part_request(ctx, vars).await?)
    } else if name == GetPartRequestsByMechanic::NAME {
        let vars = decode_variables::<GetPartRequestsByMechanic>(variables)?;
        encode_data(get_part_requests_by_mechanic(ctx, vars).await?)
    } else if name == CreateShopProfile::NAME {
        let vars = decode_variables::<CreateShopProfile>(variables)?;
        encode_data(create_shop_profile(ctx, vars).await?)
    } else if name == ListShopProfiles::NAME {
        decode_variables::<ListShopProfiles>(variables)?;
        encode_data(list_shop_profiles(ctx).await?)
    } else {
        Err(ApiError::not_found(format!("unknown operation {name}")))
    }
}

// A missing `variables` field decodes like an empty object.
fn decode_variables<O: Operation>(variables: Value) -> Result<O::Variables, ApiError> {
    let variables = match variables {
        Value::Null => Value::Object(Default::default()),
        other => other,
    };
    serde_json::from_value(variables)
        .map_err(|e| ApiError::validation(format!("invalid variables for {}: {e}", O::NAME)))
}

fn encode_data(data: impl Serialize) -> Result<Value, ApiError> {
    serde_json::to_value(data).map_err(|e| ApiError::new(ErrorCode::Internal, e.to_string()))
}

fn internal(err: anyhow::Error) -> ApiError {
    ApiError::new(ErrorCode::Internal, err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use shared::domain::UserId;

    async fn setup() -> ApiContext {
        let storage = Storage::new("sqlite::memory:").await.expect("db");
        ApiContext { storage }
    }

    fn request(name: &str, variables: Value) -> OperationRequest {
        OperationRequest {
            operation_name: name.into(),
            variables,
        }
    }

    #[tokio::test]
    async fn inserted_request_is_returned_by_mechanic_query() {
        let ctx = setup().await;
        let mechanic = UserId::new();
        let inserted = insert_part_request(
            &ctx,
            InsertPartRequestVariables::new(mechanic, "brake pads", "Toyota", "Camry", 2018),
        )
        .await
        .expect("insert");

        let listed = get_part_requests_by_mechanic(
            &ctx,
            GetPartRequestsByMechanicVariables {
                mechanic_id: mechanic,
            },
        )
        .await
        .expect("list");
        assert_eq!(listed.part_requests.len(), 1);
        assert_eq!(listed.part_requests[0].id, inserted.key.id);
    }

    #[tokio::test]
    async fn blank_required_field_is_a_validation_error() {
        let ctx = setup().await;
        let err = create_shop_profile(
            &ctx,
            CreateShopProfileVariables::new(UserId::new(), " ", "AutoParts Plus"),
        )
        .await
        .expect_err("should fail");
        assert_eq!(err.code, ErrorCode::Validation);
        assert!(list_shop_profiles(&ctx)
            .await
            .expect("list")
            .shop_profiles
            .is_empty());
    }

    #[tokio::test]
    async fn execute_dispatches_by_operation_name() {
        let ctx = setup().await;
        let created = execute_operation(
            &ctx,
            OperationKind::Mutation,
            request(
                "CreateShopProfile",
                json!({
                    "userId": UserId::new(),
                    "deliveryOptions": ["pickup"],
                    "primaryContactPerson": "Dana",
                    "shopName": "AutoParts Plus",
                }),
            ),
        )
        .await
        .expect("create");
        assert!(created["shopProfile_insert"]["id"].is_string());

        let listed = execute_operation(
            &ctx,
            OperationKind::Query,
            request("ListShopProfiles", Value::Null),
        )
        .await
        .expect("list");
        assert_eq!(listed["shopProfiles"][0]["shopName"], "AutoParts Plus");
        assert_eq!(listed["shopProfiles"][0]["deliveryOptions"], json!(["pickup"]));
        assert!(listed["shopProfiles"][0].get("inventorySpecialties").is_none());
    }

    #[tokio::test]
    async fn mutation_through_query_endpoint_is_rejected() {
        let ctx = setup().await;
        let err = execute_operation(
            &ctx,
            OperationKind::Query,
            request("InsertPartRequest", json!({})),
        )
        .await
        .expect_err("should fail");
        assert_eq!(err.code, ErrorCode::Validation);
    }

    #[tokio::test]
    async fn unknown_operation_is_not_found() {
        let ctx = setup().await;
        let err = execute_operation(
            &ctx,
            OperationKind::Mutation,
            request("DeletePartRequest", Value::Null),
        )
        .await
        .expect_err("should fail");
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn malformed_variables_are_a_validation_error() {
        let ctx = setup().await;
        let err = execute_operation(
            &ctx,
            OperationKind::Mutation,
            request(
                "InsertPartRequest",
                json!({ "mechanicId": "not-a-uuid", "vehicleYear": "2018" }),
            ),
        )
        .await
        .expect_err("should fail");
        assert_eq!(err.code, ErrorCode::Validation);
        assert!(err.message.contains("InsertPartRequest"));
    }
}
