use shared::{
    domain::UserId,
    optional::OptionalVariable,
    protocol::{CreateShopProfileVariables, InsertPartRequestVariables},
};

use crate::error::ConnectorError;

/// Raw text as typed into the part request form.
#[derive(Debug, Clone, Default)]
pub struct PartRequestForm {
    pub vehicle_make: String,
    pub vehicle_model: String,
    pub vehicle_year: String,
    pub part_description: String,
    pub vin: String,
    pub urgency: String,
}

impl PartRequestForm {
    /// Blank optional fields are left out of the request entirely.
    pub fn into_variables(self, mechanic_id: UserId) -> Result<InsertPartRequestVariables, ConnectorError> {
        let year = self.vehicle_year.trim();
        let vehicle_year = year.parse::<i32>().map_err(|_| {
            ConnectorError::Validation(format!("vehicleYear must be a whole number, got {year:?}"))
        })?;

        let mut variables = InsertPartRequestVariables::new(
            mechanic_id,
            self.part_description.trim(),
            self.vehicle_make.trim(),
            self.vehicle_model.trim(),
            vehicle_year,
        );
        variables.vin = optional_text(&self.vin);
        variables.urgency = optional_text(&self.urgency);
        variables.validate()?;
        Ok(variables)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ShopProfileForm {
    pub shop_name: String,
    pub primary_contact_person: String,
    /// Comma separated.
    pub delivery_options: String,
    /// Comma separated.
    pub inventory_specialties: String,
}

impl ShopProfileForm {
    pub fn into_variables(self, user_id: UserId) -> Result<CreateShopProfileVariables, ConnectorError> {
        let mut variables = CreateShopProfileVariables::new(
            user_id,
            self.primary_contact_person.trim(),
            self.shop_name.trim(),
        );
        variables.delivery_options = optional_list(&self.delivery_options);
        variables.inventory_specialties = optional_list(&self.inventory_specialties);
        variables.validate()?;
        Ok(variables)
    }
}

fn optional_text(raw: &str) -> OptionalVariable<String> {
    match raw.trim() {
        "" => OptionalVariable::Undefined,
        value => OptionalVariable::Value(value.to_string()),
    }
}

fn optional_list(raw: &str) -> OptionalVariable<Vec<String>> {
    let items: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect();
    if items.is_empty() {
        OptionalVariable::Undefined
    } else {
        OptionalVariable::Value(items)
    }
}
