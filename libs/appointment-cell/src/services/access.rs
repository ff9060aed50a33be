//! Role-scoped visibility and mutation rules over appointment records,
//! independent of storage mechanics.

use uuid::Uuid;

use shared_models::auth::User;

use crate::models::{
    ActorRole, Appointment, AppointmentError, AppointmentStatus, UpdateAppointmentRequest,
};

/// The authenticated caller as the access-control layer sees it.
#[derive(Debug, Clone, Copy)]
pub struct Actor {
    pub id: Uuid,
    pub role: ActorRole,
}

impl Actor {
    pub fn from_user(user: &User) -> Result<Self, AppointmentError> {
        let id = Uuid::parse_str(&user.id)
            .map_err(|_| AppointmentError::Validation("Invalid user id.".to_string()))?;
        let role = if user.is_admin() { ActorRole::Admin } else { ActorRole::Customer };
        Ok(Self { id, role })
    }
}

/// Admins see everything; customers only their own appointments.
pub fn can_access(appointment: &Appointment, actor: &Actor) -> bool {
    actor.role == ActorRole::Admin || appointment.customer == actor.id
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateField {
    Customer,
    Service,
    AppointmentDate,
    StartTime,
    EndTime,
    Status,
    Notes,
}

pub fn allowed_update_fields(role: ActorRole) -> &'static [UpdateField] {
    match role {
        ActorRole::Admin => &[
            UpdateField::Customer,
            UpdateField::Service,
            UpdateField::AppointmentDate,
            UpdateField::StartTime,
            UpdateField::EndTime,
            UpdateField::Status,
            UpdateField::Notes,
        ],
        ActorRole::Customer => &[
            UpdateField::AppointmentDate,
            UpdateField::StartTime,
            UpdateField::EndTime,
            UpdateField::Status,
            UpdateField::Notes,
        ],
    }
}

/// Intersect the requested fields with the role's allowed set. Disallowed
/// fields are dropped silently, never rejected.
pub fn filter_update(request: &UpdateAppointmentRequest, role: ActorRole) -> UpdateAppointmentRequest {
    let allowed = allowed_update_fields(role);
    let keep = |field: UpdateField| allowed.contains(&field);

    UpdateAppointmentRequest {
        customer: request.customer.clone().filter(|_| keep(UpdateField::Customer)),
        service: request.service.clone().filter(|_| keep(UpdateField::Service)),
        appointment_date: request.appointment_date.clone().filter(|_| keep(UpdateField::AppointmentDate)),
        start_time: request.start_time.clone().filter(|_| keep(UpdateField::StartTime)),
        end_time: request.end_time.clone().filter(|_| keep(UpdateField::EndTime)),
        status: request.status.filter(|_| keep(UpdateField::Status)),
        notes: request.notes.clone().filter(|_| keep(UpdateField::Notes)),
    }
}

/// The status rule is a table lookup, not a special case: a role may only
/// assign statuses listed for it.
pub fn check_status_policy(
    update: &UpdateAppointmentRequest,
    role: ActorRole,
) -> Result<(), AppointmentError> {
    if let Some(status) = update.status {
        if !AppointmentStatus::assignable_by(role).contains(&status) {
            return Err(AppointmentError::Forbidden(
                "Customers can only change status to cancelled.".to_string(),
            ));
        }
    }
    Ok(())
}

/// Who the new appointment belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CustomerResolution {
    /// The actor books for themselves.
    Own(Uuid),
    /// Admin-supplied target; the caller must verify the user exists with
    /// role "customer" before writing.
    Requested(Uuid),
}

/// Customers always book as themselves, whatever id they send. Admins may
/// name a customer; with no id the appointment lands on the admin's own id.
pub fn resolve_customer_for_create(
    requested: Option<&str>,
    actor: &Actor,
) -> Result<CustomerResolution, AppointmentError> {
    match (actor.role, requested) {
        (ActorRole::Admin, Some(id)) if !id.is_empty() => {
            let customer_id = Uuid::parse_str(id)
                .map_err(|_| AppointmentError::Validation("Invalid customer id.".to_string()))?;
            Ok(CustomerResolution::Requested(customer_id))
        }
        _ => Ok(CustomerResolution::Own(actor.id)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};

    fn actor(role: ActorRole) -> Actor {
        Actor { id: Uuid::new_v4(), role }
    }

    fn appointment_owned_by(customer: Uuid) -> Appointment {
        Appointment {
            id: Uuid::new_v4(),
            customer,
            service: Uuid::new_v4(),
            appointment_date: NaiveDate::from_ymd_opt(2025, 6, 2).unwrap(),
            start_time: "10:00 AM".to_string(),
            end_time: "11:00 AM".to_string(),
            status: AppointmentStatus::Pending,
            notes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn owner_and_admin_can_access() {
        let owner = actor(ActorRole::Customer);
        let other = actor(ActorRole::Customer);
        let admin = actor(ActorRole::Admin);
        let appointment = appointment_owned_by(owner.id);

        assert!(can_access(&appointment, &owner));
        assert!(!can_access(&appointment, &other));
        assert!(can_access(&appointment, &admin));
    }

    #[test]
    fn filter_drops_protected_fields_for_customers() {
        let request = UpdateAppointmentRequest {
            customer: Some(Uuid::new_v4().to_string()),
            service: Some(Uuid::new_v4().to_string()),
            start_time: Some("9:00 AM".to_string()),
            notes: Some("updated".to_string()),
            ..Default::default()
        };

        let filtered = filter_update(&request, ActorRole::Customer);
        assert!(filtered.customer.is_none());
        assert!(filtered.service.is_none());
        assert_eq!(filtered.start_time.as_deref(), Some("9:00 AM"));
        assert_eq!(filtered.notes.as_deref(), Some("updated"));

        let filtered = filter_update(&request, ActorRole::Admin);
        assert!(filtered.customer.is_some());
        assert!(filtered.service.is_some());
    }

    #[test]
    fn customers_may_only_cancel() {
        let confirm = UpdateAppointmentRequest {
            status: Some(AppointmentStatus::Confirmed),
            ..Default::default()
        };
        let cancel = UpdateAppointmentRequest {
            status: Some(AppointmentStatus::Cancelled),
            ..Default::default()
        };

        assert!(check_status_policy(&confirm, ActorRole::Customer).is_err());
        assert!(check_status_policy(&cancel, ActorRole::Customer).is_ok());
        assert!(check_status_policy(&confirm, ActorRole::Admin).is_ok());
    }

    #[test]
    fn customer_is_always_booked_as_themselves() {
        let customer = actor(ActorRole::Customer);
        let someone_else = Uuid::new_v4().to_string();

        let resolution = resolve_customer_for_create(Some(&someone_else), &customer).unwrap();
        assert_eq!(resolution, CustomerResolution::Own(customer.id));
    }

    #[test]
    fn admin_books_on_behalf_or_for_themselves() {
        let admin = actor(ActorRole::Admin);
        let target = Uuid::new_v4();

        let resolution =
            resolve_customer_for_create(Some(&target.to_string()), &admin).unwrap();
        assert_eq!(resolution, CustomerResolution::Requested(target));

        let resolution = resolve_customer_for_create(None, &admin).unwrap();
        assert_eq!(resolution, CustomerResolution::Own(admin.id));
    }

    #[test]
    fn admin_supplied_customer_id_must_be_well_formed() {
        let admin = actor(ActorRole::Admin);
        let err = resolve_customer_for_create(Some("not-a-uuid"), &admin).unwrap_err();
        assert!(matches!(err, AppointmentError::Validation(_)));
    }
}
