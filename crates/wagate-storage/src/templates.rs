// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Template catalogue and approval state machine.
//!
//! Templates are created `pending` and move exactly once, to `approved` or
//! `rejected`. Dispatch only ever sends approved templates.

use std::collections::HashSet;
use std::sync::{Arc, LazyLock};

use regex::{Captures, Regex};
use tracing::info;
use wagate_core::{
    Clock, GatewayError, NewTemplate, StorageAdapter, Template, TemplateFilter, TemplateStatus,
};

static TEMPLATE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9_]{1,512}$").unwrap());

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{\s*([A-Za-z0-9_]+)\s*\}\}").unwrap());

/// CRUD and status transitions for message templates.
#[derive(Clone)]
pub struct TemplateLifecycle {
    storage: Arc<dyn StorageAdapter>,
    clock: Arc<dyn Clock>,
}

impl TemplateLifecycle {
    pub fn new(storage: Arc<dyn StorageAdapter>, clock: Arc<dyn Clock>) -> Self {
        Self { storage, clock }
    }

    /// Validate and store a new template. The stored status is always `pending`.
    pub async fn create(&self, input: NewTemplate) -> Result<Template, GatewayError> {
        validate_new_template(&input)?;

        let now = self.clock.now();
        let template = Template {
            id: uuid::Uuid::new_v4().to_string(),
            name: input.name,
            locale: input.locale,
            category: input.category,
            body: input.body,
            variables: input.variables,
            status: TemplateStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        self.storage.insert_template(&template).await?;
        info!(id = %template.id, name = %template.name, "template created");
        Ok(template)
    }

    pub async fn list(&self, filter: &TemplateFilter) -> Result<Vec<Template>, GatewayError> {
        self.storage.list_templates(filter).await
    }

    pub async fn get_by_name(&self, name: &str) -> Result<Template, GatewayError> {
        self.storage
            .get_template_by_name(name)
            .await?
            .ok_or_else(|| GatewayError::NotFound {
                entity: "template",
                key: name.to_string(),
            })
    }

    pub async fn get(&self, id: &str) -> Result<Template, GatewayError> {
        self.storage
            .get_template(id)
            .await?
            .ok_or_else(|| GatewayError::NotFound {
                entity: "template",
                key: id.to_string(),
            })
    }

    /// `pending -> approved`.
    pub async fn approve(&self, id: &str) -> Result<Template, GatewayError> {
        self.transition(id, TemplateStatus::Approved).await
    }

    /// `pending -> rejected`.
    pub async fn reject(&self, id: &str) -> Result<Template, GatewayError> {
        self.transition(id, TemplateStatus::Rejected).await
    }

    async fn transition(&self, id: &str, to: TemplateStatus) -> Result<Template, GatewayError> {
        let changed = self
            .storage
            .transition_template_status(id, to, self.clock.now())
            .await?;
        let current = self.get(id).await?;
        if !changed {
            return Err(GatewayError::InvalidTransition {
                id: id.to_string(),
                from: current.status,
                to,
            });
        }
        info!(id, name = %current.name, status = %to, "template status changed");
        Ok(current)
    }

    /// The named template, provided it is approved.
    pub async fn resolve_approved(&self, name: &str) -> Result<Template, GatewayError> {
        let template = self.get_by_name(name).await?;
        if template.status != TemplateStatus::Approved {
            return Err(GatewayError::TemplateNotApproved {
                name: template.name,
                status: template.status,
            });
        }
        Ok(template)
    }
}

fn validate_new_template(input: &NewTemplate) -> Result<(), GatewayError> {
    if !TEMPLATE_NAME.is_match(&input.name) {
        return Err(GatewayError::Validation(format!(
            "template name `{}` must be 1-512 characters of lowercase letters, digits and underscores",
            input.name
        )));
    }
    if input.locale.trim().is_empty() {
        return Err(GatewayError::Validation("template locale must not be empty".into()));
    }
    if input.body.trim().is_empty() {
        return Err(GatewayError::Validation("template body must not be empty".into()));
    }
    let mut seen = HashSet::new();
    for var in &input.variables {
        if var.trim().is_empty() {
            return Err(GatewayError::Validation(
                "template variable names must not be empty".into(),
            ));
        }
        if !seen.insert(var.as_str()) {
            return Err(GatewayError::Validation(format!(
                "template variable `{var}` is declared twice"
            )));
        }
    }
    Ok(())
}

/// Substitute `values` into the template body.
///
/// `{{n}}` takes the n-th value (1-based) and `{{name}}` the value at the
/// declared variable's position. Unknown placeholders are left untouched.
/// The number of values must equal the number of declared variables.
pub fn render(template: &Template, values: &[String]) -> Result<String, GatewayError> {
    if values.len() != template.variables.len() {
        return Err(GatewayError::Validation(format!(
            "template `{}` expects {} variable(s), got {}",
            template.name,
            template.variables.len(),
            values.len()
        )));
    }

    let rendered = PLACEHOLDER.replace_all(&template.body, |caps: &Captures<'_>| {
        let key = &caps[1];
        let position = key
            .parse::<usize>()
            .ok()
            .filter(|n| (1..=values.len()).contains(n))
            .map(|n| n - 1)
            .or_else(|| template.variables.iter().position(|v| v == key));
        match position {
            Some(i) => values[i].clone(),
            None => caps[0].to_string(),
        }
    });
    Ok(rendered.into_owned())
}
