use std::sync::Arc;

use serde_json::Value;
use shared::{
    domain::{PartRequest, PartRequestId, ShopProfile, ShopProfileId, UserId},
    protocol::{
        CreateShopProfile, CreateShopProfileVariables, GetPartRequestsByMechanic,
        GetPartRequestsByMechanicVariables, InsertPartRequest, InsertPartRequestVariables,
        ListShopProfiles, ListShopProfilesVariables, Operation, OperationKind, OperationRequest,
        Query,
    },
};
use tracing::info;

use crate::{
    error::ConnectorError,
    subscription::QueryRef,
    transport::{HttpTransport, OperationTransport},
};

/// Client handle for the `example` connector. Cheap to clone.
#[derive(Clone)]
pub struct ExampleConnector {
    transport: Arc<dyn OperationTransport>,
}

impl ExampleConnector {
    pub fn new(transport: Arc<dyn OperationTransport>) -> Self {
        Self { transport }
    }

    pub fn connect(server_url: &str) -> Result<Self, ConnectorError> {
        let transport = HttpTransport::new(server_url, Default::default())?;
        Ok(Self::new(Arc::new(transport)))
    }

    pub async fn execute<O: Operation>(
        &self,
        variables: &O::Variables,
    ) -> Result<O::Data, ConnectorError> {
        let variables = serde_json::to_value(variables).map_err(|e| ConnectorError::Decode {
            operation: O::NAME.to_string(),
            message: e.to_string(),
        })?;
        let data = self.execute_raw(O::NAME, O::KIND, variables).await?;
        serde_json::from_value(data).map_err(|e| ConnectorError::Decode {
            operation: O::NAME.to_string(),
            message: e.to_string(),
        })
    }

    pub async fn execute_raw(
        &self,
        operation_name: &str,
        kind: OperationKind,
        variables: Value,
    ) -> Result<Value, ConnectorError> {
        self.transport
            .execute(
                kind,
                OperationRequest {
                    operation_name: operation_name.to_string(),
                    variables,
                },
            )
            .await
    }

    pub fn query_ref<O: Query>(&self, variables: O::Variables) -> QueryRef<O> {
        QueryRef::new(self.clone(), variables)
    }

    pub async fn insert_part_request(
        &self,
        variables: InsertPartRequestVariables,
    ) -> Result<PartRequestId, ConnectorError> {
        variables.validate()?;
        let data = self.execute::<InsertPartRequest>(&variables).await?;
        info!(part_request_id = %data.key.id, "part request submitted");
        Ok(data.key.id)
    }

    pub async fn get_part_requests_by_mechanic(
        &self,
        mechanic_id: UserId,
    ) -> Result<Vec<PartRequest>, ConnectorError> {
        let data = self
            .execute::<GetPartRequestsByMechanic>(&GetPartRequestsByMechanicVariables {
                mechanic_id,
            })
            .await?;
        Ok(data.part_requests)
    }

    pub async fn create_shop_profile(
        &self,
        variables: CreateShopProfileVariables,
    ) -> Result<ShopProfileId, ConnectorError> {
        variables.validate()?;
        let data = self.execute::<CreateShopProfile>(&variables).await?;
        info!(shop_profile_id = %data.key.id, "shop profile created");
        Ok(data.key.id)
    }

    pub async fn list_shop_profiles(&self) -> Result<Vec<ShopProfile>, ConnectorError> {
        let data = self
            .execute::<ListShopProfiles>(&ListShopProfilesVariables::default())
            .await?;
        Ok(data.shop_profiles)
    }
}
