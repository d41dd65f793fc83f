//! Organizer-side iTip composition (RFC 5546, RFC 6638).
//!
//! Compares the scheduling state of an event before and after a change and
//! builds one REQUEST or CANCEL message per affected attendee.

use std::collections::BTreeSet;

use chrono::Utc;
use sha2::{Digest, Sha256};

use kunai_core::config::SchedulingConfig;
use kunai_core::constants::{DEFAULT_PRODID, MASTER_INSTANCE_KEY};
use kunai_rfc::rfc::ical::core::{
    Component, DateTime, DateTimeForm, DateTimeValue, ICalendar, Parameter, Property, names,
    normalize_cal_address, param_names,
};

use super::itip::{ItipMessage, ItipMethod};
use crate::error::{ServiceError, ServiceResult};

/// Properties whose change makes an update significant for attendees.
const SIGNIFICANT_CHANGE_PROPERTIES: [&str; 11] = [
    names::DTSTART,
    names::DTEND,
    names::DURATION,
    names::DUE,
    names::RRULE,
    names::RDATE,
    names::EXDATE,
    names::STATUS,
    names::SUMMARY,
    names::DESCRIPTION,
    names::LOCATION,
];

const SCHEDULE_AGENT_SERVER: &str = "SERVER";
const SCHEDULE_AGENT_CLIENT: &str = "CLIENT";
const PARTSTAT_NEEDS_ACTION: &str = "NEEDS-ACTION";
const STATUS_CANCELLED: &str = "CANCELLED";

/// An attendee's participation in one instance of the series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceParticipation {
    /// `master` or the RECURRENCE-ID value.
    pub id: String,
    pub partstat: String,
    pub force_send: Option<String>,
}

/// An attendee and the instances they are invited to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendeeInfo {
    /// Normalized calendar user address.
    pub href: String,
    pub name: Option<String>,
    pub force_send: Option<String>,
    pub instances: Vec<InstanceParticipation>,
}

/// One VEVENT of the series with its instance key.
#[derive(Debug, Clone)]
pub struct EventInstance {
    /// `master` or the RECURRENCE-ID value.
    pub key: String,
    pub recurrence_id: Option<DateTimeValue>,
    pub component: Component,
}

/// Scheduling state of one version of an event series.
#[derive(Debug, Clone)]
pub struct EventInfo {
    pub uid: Option<String>,
    /// Normalized calendar user address of the organizer.
    pub organizer: Option<String>,
    pub organizer_name: Option<String>,
    pub organizer_schedule_agent: String,
    pub organizer_force_send: Option<String>,
    pub sequence: i32,
    pub status: Option<String>,
    /// EXDATE values of every instance, sorted.
    pub exdates: Vec<String>,
    /// Instances that carry at least one ATTENDEE, in document order.
    pub instances: Vec<EventInstance>,
    /// Attendees in order of first appearance.
    pub attendees: Vec<AttendeeInfo>,
    /// TZID of the first instance's DTSTART or RECURRENCE-ID.
    pub timezone: Option<String>,
    /// Hex SHA-256 over the significant properties, empty for no event.
    pub significant_change_hash: String,
}

impl Default for EventInfo {
    fn default() -> Self {
        Self {
            uid: None,
            organizer: None,
            organizer_name: None,
            organizer_schedule_agent: SCHEDULE_AGENT_SERVER.to_string(),
            organizer_force_send: None,
            sequence: 0,
            status: None,
            exdates: Vec::new(),
            instances: Vec::new(),
            attendees: Vec::new(),
            timezone: None,
            significant_change_hash: String::new(),
        }
    }
}

impl EventInfo {
    /// Instance by key, `master` for the base instance.
    #[must_use]
    pub fn instance(&self, key: &str) -> Option<&EventInstance> {
        self.instances.iter().find(|instance| instance.key == key)
    }

    #[must_use]
    pub fn attendee(&self, href: &str) -> Option<&AttendeeInfo> {
        self.attendees.iter().find(|attendee| attendee.href == href)
    }

    fn is_cancelled(&self) -> bool {
        self.status.as_deref() == Some(STATUS_CANCELLED)
    }
}

/// An attendee of either version, with their old and new invitations.
#[derive(Debug, Clone)]
struct MergedAttendee {
    href: String,
    name: Option<String>,
    force_send: Option<String>,
    old_instances: Vec<InstanceParticipation>,
    new_instances: Vec<InstanceParticipation>,
}

/// Builds outbound scheduling messages for organizer changes.
#[derive(Debug, Clone)]
pub struct TipBroker {
    schedule_agent_server_rules: bool,
    prodid: String,
}

impl Default for TipBroker {
    fn default() -> Self {
        Self {
            schedule_agent_server_rules: true,
            prodid: DEFAULT_PRODID.to_string(),
        }
    }
}

impl TipBroker {
    #[must_use]
    pub fn new(config: &SchedulingConfig) -> Self {
        Self {
            schedule_agent_server_rules: config.schedule_agent_server_rules,
            prodid: config.prodid.clone(),
        }
    }

    /// ## Summary
    /// Works out which messages a change made by `user_href` requires.
    ///
    /// `calendar` is `None` when the object was deleted and `old` is `None`
    /// when it was just created. Only changes made by the organizer produce
    /// messages; an attendee's own changes are left to the reply path.
    ///
    /// ## Errors
    /// Returns `ServiceError::SchedulingError` if either version breaks the
    /// rules checked by [`TipBroker::parse_event_info`].
    #[tracing::instrument(skip(self, calendar, old))]
    pub fn parse_event(
        &self,
        calendar: Option<&ICalendar>,
        user_href: &str,
        old: Option<&ICalendar>,
    ) -> ServiceResult<Vec<ItipMessage>> {
        let user_href = normalize_cal_address(user_href);

        let old_info = match old {
            Some(old) if old.events().is_empty() => {
                tracing::debug!("Previous version holds no VEVENT");
                return Ok(Vec::new());
            }
            Some(old) => self.parse_event_info(old)?,
            None => EventInfo::default(),
        };

        let (base, event_info) = if let Some(calendar) = calendar {
            if calendar.events().is_empty() {
                tracing::debug!("Calendar holds no VEVENT");
                return Ok(Vec::new());
            }
            let mut info = self.parse_event_info(calendar)?;
            if info.attendees.is_empty() && old_info.attendees.is_empty() {
                tracing::trace!("No attendees before or after the change");
                return Ok(Vec::new());
            }
            if info.organizer.is_none() {
                if old_info.organizer.is_none() {
                    tracing::trace!("No organizer before or after the change");
                    return Ok(Vec::new());
                }
                info.organizer.clone_from(&old_info.organizer);
                info.organizer_name.clone_from(&old_info.organizer_name);
            }
            (calendar, info)
        } else {
            let Some(old) = old else {
                return Ok(Vec::new());
            };
            let mut info = old_info.clone();
            if info.organizer.as_deref() == Some(user_href.as_str()) {
                info.attendees.clear();
                info.sequence = info.sequence.saturating_add(1);
            }
            (old, info)
        };

        if event_info.organizer.as_deref() != Some(user_href.as_str()) {
            tracing::debug!("Change not made by the organizer, no messages");
            return Ok(Vec::new());
        }
        if !event_info
            .organizer_schedule_agent
            .eq_ignore_ascii_case(SCHEDULE_AGENT_SERVER)
        {
            tracing::debug!(
                schedule_agent = %event_info.organizer_schedule_agent,
                "Organizer schedules on the client, no messages"
            );
            return Ok(Vec::new());
        }

        Ok(self.parse_event_for_organizer(base, &event_info, &old_info))
    }

    /// ## Summary
    /// Collects the scheduling state of every VEVENT in `calendar`.
    ///
    /// ## Errors
    /// Returns `ServiceError::SchedulingError` if the VEVENTs do not share
    /// one UID, one lacks DTSTART, or they name different organizers.
    pub fn parse_event_info(&self, calendar: &ICalendar) -> ServiceResult<EventInfo> {
        let mut info = EventInfo::default();
        let mut sequence = None;
        let mut hash_input = String::new();

        for vevent in calendar.events() {
            let uid = vevent.uid().unwrap_or_default();
            match &info.uid {
                None => info.uid = Some(uid.to_string()),
                Some(existing) if existing != uid => {
                    return Err(ServiceError::SchedulingError(
                        "all VEVENTs of a calendar object must share one UID".to_string(),
                    ));
                }
                Some(_) => {}
            }

            let Some(dtstart) = vevent.get_property(names::DTSTART) else {
                return Err(ServiceError::SchedulingError(
                    "an event must have a DTSTART".to_string(),
                ));
            };

            if let Some(organizer) = vevent.get_property(names::ORGANIZER) {
                let href = normalize_cal_address(&organizer.raw_value);
                match &info.organizer {
                    None => {
                        info.organizer = Some(href);
                        info.organizer_name =
                            organizer.get_param_value(param_names::CN).map(str::to_string);
                    }
                    Some(existing) if !existing.eq_ignore_ascii_case(&href) => {
                        return Err(ServiceError::SchedulingError(
                            "every instance of the event must have the same organizer"
                                .to_string(),
                        ));
                    }
                    Some(_) => {}
                }
                info.organizer_force_send = upper_param(organizer, param_names::SCHEDULE_FORCE_SEND);
                info.organizer_schedule_agent =
                    upper_param(organizer, param_names::SCHEDULE_AGENT)
                        .unwrap_or_else(|| SCHEDULE_AGENT_SERVER.to_string());
            }

            if sequence.is_none() {
                sequence = vevent
                    .get_property(names::SEQUENCE)
                    .and_then(Property::as_integer);
            }

            for exdate in vevent.get_properties(names::EXDATE) {
                info.exdates.extend(
                    exdate
                        .raw_value
                        .split(',')
                        .map(str::trim)
                        .filter(|part| !part.is_empty())
                        .map(str::to_string),
                );
            }
            info.exdates.sort();

            if let Some(status) = vevent.get_property(names::STATUS) {
                info.status = Some(status.raw_value.trim().to_ascii_uppercase());
            }

            let recurrence_id = vevent.get_property(names::RECURRENCE_ID);
            let key = recurrence_id.map_or_else(
                || MASTER_INSTANCE_KEY.to_string(),
                |property| property.raw_value.clone(),
            );
            if info.timezone.is_none() {
                info.timezone = recurrence_id
                    .unwrap_or(dtstart)
                    .tzid()
                    .map(str::to_string);
            }

            let attendees = vevent.get_properties(names::ATTENDEE);
            if !attendees.is_empty() {
                for attendee in attendees {
                    self.collect_attendee(&mut info, attendee, &key);
                }
                info.instances.push(EventInstance {
                    key,
                    recurrence_id: vevent.recurrence_id(),
                    component: vevent.clone(),
                });
            }

            append_significant_values(&mut hash_input, vevent, &info.exdates);
        }

        info.sequence = sequence.unwrap_or_default();
        info.significant_change_hash = hex::encode(Sha256::digest(hash_input.as_bytes()));
        tracing::trace!(
            uid = ?info.uid,
            attendees = info.attendees.len(),
            instances = info.instances.len(),
            "Parsed event scheduling state"
        );
        Ok(info)
    }

    fn collect_attendee(&self, info: &mut EventInfo, attendee: &Property, key: &str) {
        if self.schedule_agent_server_rules
            && upper_param(attendee, param_names::SCHEDULE_AGENT).as_deref()
                == Some(SCHEDULE_AGENT_CLIENT)
        {
            tracing::trace!(attendee = %attendee.raw_value, "Attendee schedules on the client");
            return;
        }

        let href = normalize_cal_address(&attendee.raw_value);
        let force_send = upper_param(attendee, param_names::SCHEDULE_FORCE_SEND);
        let participation = InstanceParticipation {
            id: key.to_string(),
            partstat: upper_param(attendee, param_names::PARTSTAT)
                .unwrap_or_else(|| PARTSTAT_NEEDS_ACTION.to_string()),
            force_send: force_send.clone(),
        };

        match info.attendees.iter_mut().find(|a| a.href == href) {
            Some(existing) => existing.instances.push(participation),
            None => info.attendees.push(AttendeeInfo {
                href,
                name: attendee.get_param_value(param_names::CN).map(str::to_string),
                force_send,
                instances: vec![participation],
            }),
        }
    }

    /// ## Summary
    /// Builds one message per attendee of either version, skipping the
    /// organizer.
    ///
    /// An attendee with no remaining instances, or any attendee of a
    /// cancelled event, gets a CANCEL. Everyone else gets a REQUEST carrying
    /// the instances they are invited to.
    #[must_use]
    pub fn parse_event_for_organizer(
        &self,
        calendar: &ICalendar,
        event_info: &EventInfo,
        old_info: &EventInfo,
    ) -> Vec<ItipMessage> {
        let organizer = event_info.organizer.clone().unwrap_or_default();
        let mut messages = Vec::new();

        for attendee in merge_attendees(old_info, event_info) {
            if attendee.href == organizer {
                continue;
            }

            let cancel = attendee.new_instances.is_empty() || event_info.is_cancelled();
            let method = if cancel {
                ItipMethod::Cancel
            } else {
                ItipMethod::Request
            };

            let mut payload = ICalendar::new(self.prodid.clone());
            payload
                .root
                .set_property(Property::text(names::METHOD, method.as_str()));
            for vtimezone in calendar.timezones() {
                payload.root.add_child(vtimezone.clone());
            }

            let significant_change = if cancel {
                let Some(vevent) = cancel_event(event_info, old_info, &attendee) else {
                    tracing::warn!(recipient = %attendee.href, "No instance to cancel");
                    continue;
                };
                payload.root.add_child(vevent);
                true
            } else {
                for vevent in request_events(event_info, &attendee) {
                    payload.root.add_child(vevent);
                }
                is_significant(&attendee, event_info, old_info)
            };

            tracing::debug!(
                recipient = %attendee.href,
                %method,
                significant_change,
                "Composed iTip message"
            );

            messages.push(ItipMessage {
                uid: event_info.uid.clone().unwrap_or_default(),
                component: "VEVENT".to_string(),
                method,
                sequence: event_info.sequence,
                sender: organizer.clone(),
                sender_name: event_info.organizer_name.clone(),
                recipient: attendee.href,
                recipient_name: attendee.name,
                significant_change,
                message: payload,
            });
        }

        messages
    }
}

/// Old attendees first in their order, then attendees new in this version.
fn merge_attendees(old_info: &EventInfo, event_info: &EventInfo) -> Vec<MergedAttendee> {
    let mut merged: Vec<MergedAttendee> = old_info
        .attendees
        .iter()
        .map(|old| MergedAttendee {
            href: old.href.clone(),
            name: old.name.clone(),
            force_send: None,
            old_instances: old.instances.clone(),
            new_instances: Vec::new(),
        })
        .collect();

    for attendee in &event_info.attendees {
        if let Some(existing) = merged.iter_mut().find(|m| m.href == attendee.href) {
            existing.name.clone_from(&attendee.name);
            existing.new_instances.clone_from(&attendee.instances);
            existing.force_send.clone_from(&attendee.force_send);
        } else {
            merged.push(MergedAttendee {
                href: attendee.href.clone(),
                name: attendee.name.clone(),
                force_send: attendee.force_send.clone(),
                old_instances: Vec::new(),
                new_instances: attendee.instances.clone(),
            });
        }
    }
    merged
}

fn instance_keys(instances: &[InstanceParticipation]) -> BTreeSet<&str> {
    instances.iter().map(|i| i.id.as_str()).collect()
}

fn is_significant(attendee: &MergedAttendee, event_info: &EventInfo, old_info: &EventInfo) -> bool {
    attendee.force_send.as_deref() == Some(ItipMethod::Request.as_str())
        || attendee.old_instances.len() != attendee.new_instances.len()
        || instance_keys(&attendee.old_instances) != instance_keys(&attendee.new_instances)
        || old_info.significant_change_hash != event_info.significant_change_hash
}

/// ## Summary
/// Minimal copy of the base instance addressed to one attendee.
///
/// Every ATTENDEE is replaced by the recipient, and DTSTAMP and SEQUENCE
/// are refreshed.
fn cancel_event(
    event_info: &EventInfo,
    old_info: &EventInfo,
    attendee: &MergedAttendee,
) -> Option<Component> {
    let base = event_info
        .instance(MASTER_INSTANCE_KEY)
        .or_else(|| old_info.instance(MASTER_INSTANCE_KEY))
        .or_else(|| event_info.instances.first())
        .or_else(|| old_info.instances.first())?;

    let mut vevent = base.component.clone();
    vevent.set_property(dtstamp_now());
    vevent.set_property(Property::integer(names::SEQUENCE, event_info.sequence));
    vevent.remove_properties(names::ATTENDEE);

    let mut recipient = Property::cal_address(names::ATTENDEE, attendee.href.clone());
    if let Some(name) = &attendee.name {
        recipient.set_param(Parameter::cn(name.clone()));
    }
    vevent.add_property(recipient);
    Some(vevent)
}

/// Copies of the instances the attendee is invited to.
fn request_events(event_info: &EventInfo, attendee: &MergedAttendee) -> Vec<Component> {
    let invited = instance_keys(&attendee.new_instances);

    attendee
        .new_instances
        .iter()
        .filter_map(|participation| event_info.instance(&participation.id))
        .map(|instance| {
            let mut vevent = instance.component.clone();
            if instance.key == MASTER_INSTANCE_KEY {
                let excluded: Vec<DateTimeValue> = event_info
                    .instances
                    .iter()
                    .filter(|other| !invited.contains(other.key.as_str()))
                    .filter_map(|other| other.recurrence_id.clone())
                    .collect();
                merge_exdates(&mut vevent, excluded);
                clean_scheduling_params(&mut vevent);
            }
            vevent.set_property(dtstamp_now());
            vevent
        })
        .collect()
}

/// Appends `excluded` to the EXDATE values already on `vevent`, writing
/// one EXDATE per value form.
fn merge_exdates(vevent: &mut Component, excluded: Vec<DateTimeValue>) {
    if excluded.is_empty() {
        return;
    }
    let mut dates: Vec<DateTimeValue> = vevent
        .get_properties(names::EXDATE)
        .iter()
        .flat_map(|property| property.as_date_list())
        .collect();
    dates.extend(excluded);
    vevent.remove_properties(names::EXDATE);
    for property in Property::date_lists(names::EXDATE, dates) {
        vevent.add_property(property);
    }
}

/// Drops stale scheduling parameters and marks attendees without a
/// PARTSTAT as NEEDS-ACTION.
fn clean_scheduling_params(vevent: &mut Component) {
    for organizer in vevent.get_properties_mut(names::ORGANIZER) {
        organizer.remove_param(param_names::SCHEDULE_FORCE_SEND);
        organizer.remove_param(param_names::SCHEDULE_STATUS);
    }
    for attendee in vevent.get_properties_mut(names::ATTENDEE) {
        attendee.remove_param(param_names::SCHEDULE_FORCE_SEND);
        attendee.remove_param(param_names::SCHEDULE_STATUS);
        if attendee.get_param(param_names::PARTSTAT).is_none() {
            attendee.set_param(Parameter::partstat(PARTSTAT_NEEDS_ACTION));
        }
    }
}

fn append_significant_values(out: &mut String, vevent: &Component, exdates: &[String]) {
    for name in SIGNIFICANT_CHANGE_PROPERTIES {
        let properties = vevent.get_properties(name);
        if properties.is_empty() {
            continue;
        }
        out.push_str(name);
        out.push(':');
        match name {
            names::EXDATE => {
                out.push_str(&exdates.join(","));
                out.push(';');
            }
            names::RRULE => {
                let mut parts: Vec<String> = properties
                    .iter()
                    .flat_map(|property| {
                        property
                            .as_recur()
                            .map(|rule| rule.parts())
                            .unwrap_or_else(|| vec![property.raw_value.clone()])
                    })
                    .collect();
                parts.sort();
                out.push_str(&parts.join(","));
                out.push(';');
            }
            _ => {
                for property in properties {
                    out.push_str(&property.raw_value);
                    out.push(';');
                }
            }
        }
    }
}

fn upper_param(property: &Property, name: &str) -> Option<String> {
    property
        .get_param_value(name)
        .map(|value| value.trim().to_ascii_uppercase())
}

fn dtstamp_now() -> Property {
    let now = Utc::now().naive_utc();
    match DateTime::from_naive(now, DateTimeForm::Utc) {
        Some(dt) => Property::datetime(names::DTSTAMP, dt),
        None => Property::text(names::DTSTAMP, now.format("%Y%m%dT%H%M%SZ").to_string()),
    }
}
