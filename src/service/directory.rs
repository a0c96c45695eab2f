//! Employees, organizations and who acts for whom
use crate::error::{ServiceError, ServiceResult, StoreError, ValidationError};
use crate::models::{
    Employee, NewEmployee, NewOrganization, Organization, OrganizationResponsible,
};
use crate::repository::Repository;
use crate::store::Store;
use crate::types::{OrganizationId, ResponsibleId};
use std::sync::Arc;

pub struct DirectoryService<S> {
    repo: Repository<S>,
}

impl<S: Store> DirectoryService<S> {
    pub fn new(instance: Arc<S>) -> Self {
        Self {
            repo: Repository::new(instance),
        }
    }

    /// Register an employee under a unique username
    pub fn register_employee(&self, new_employee: NewEmployee) -> ServiceResult<Employee> {
        let employee = new_employee.into_employee()?;

        match self.repo.append(&employee) {
            Ok(()) => {}
            Err(StoreError::Conflict { .. }) => {
                return Err(ValidationError::UsernameTaken(employee.username).into());
            }
            Err(other) => return Err(other.into()),
        }
        tracing::info!(user = %employee.id, username = %employee.username, "employee registered");

        Ok(employee)
    }

    pub fn register_organization(
        &self,
        new_organization: NewOrganization,
    ) -> ServiceResult<Organization> {
        let organization = new_organization.into_organization()?;

        self.repo.append(&organization)?;
        tracing::info!(organization = %organization.id, name = %organization.name, "organization registered");

        Ok(organization)
    }

    /// Make `username` responsible for `organization_id`. A user represents
    /// at most one organization.
    pub fn assign_responsible(
        &self,
        organization_id: &OrganizationId,
        username: &str,
    ) -> ServiceResult<OrganizationResponsible> {
        if username.is_empty() {
            return Err(ValidationError::Missing("username").into());
        }

        let employee = self.employee(username)?;
        self.organization(organization_id)?;

        let responsible = OrganizationResponsible {
            id: ResponsibleId::generate()?,
            organization_id: organization_id.clone(),
            user_id: employee.id,
        };
        match self.repo.append(&responsible) {
            Ok(()) => {}
            Err(StoreError::Conflict { .. }) => {
                return Err(ValidationError::AlreadyResponsible(username.to_owned()).into());
            }
            Err(other) => return Err(other.into()),
        }
        tracing::info!(organization = %organization_id, username, "responsible assigned");

        Ok(responsible)
    }

    pub fn employee(&self, username: &str) -> ServiceResult<Employee> {
        self.repo
            .employee(username)?
            .ok_or_else(|| ServiceError::NotFound(format!("user {username}")))
    }

    pub fn organization(&self, organization_id: &OrganizationId) -> ServiceResult<Organization> {
        self.repo
            .organization(organization_id)?
            .ok_or_else(|| ServiceError::NotFound(format!("organization {organization_id}")))
    }
}
