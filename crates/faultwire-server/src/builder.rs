use std::sync::Arc;

use faultwire_config::{Config, FieldPolicy};
use faultwire_core::{ErrorRepresentation, Failure, RequestContext};
use jiff::Timestamp;

use crate::resolver::Resolver;

/// Builds representations from failures, one per failure event
#[derive(Debug, Clone)]
pub struct RepresentationBuilder {
    config: Arc<Config>,
    resolver: Resolver,
}

impl RepresentationBuilder {
    pub const fn new(config: Arc<Config>, resolver: Resolver) -> Self {
        Self { config, resolver }
    }

    /// Build the representation of a failure and its cause chain
    ///
    /// Causes are built innermost first with their own field policy. A
    /// failure that carries a representation from another service ends
    /// the walk; the carried value is reconfigured under the carrier's
    /// policy and becomes its cause.
    pub fn build(&self, failure: &dyn Failure, ctx: &RequestContext) -> ErrorRepresentation {
        let max_depth = self.config.max_cause_depth;
        let mut links: Vec<&dyn Failure> = Vec::new();
        let mut current = Some(failure);

        while let Some(link) = current {
            if links.len() == max_depth {
                tracing::warn!(max_depth, "cause chain truncated while building error representation");
                break;
            }
            links.push(link);
            if link.as_carries_representation().is_some() {
                break;
            }
            current = link.cause();
        }

        let now = Timestamp::now();
        let mut built: Option<ErrorRepresentation> = None;

        for (depth, link) in links.iter().enumerate().rev() {
            let policy = self.resolver.policy_for(*link);
            let cause = match link.as_carries_representation() {
                Some(carrier) => Some(reconfigure(carrier.representation(), &policy, max_depth)),
                None => built.take(),
            };
            built = Some(self.build_one(*link, ctx, &policy, cause, now, depth == 0));
        }

        built.unwrap_or_else(|| self.build_one(failure, ctx, &self.resolver.policy_for(failure), None, now, true))
    }

    fn build_one(
        &self,
        failure: &dyn Failure,
        ctx: &RequestContext,
        policy: &FieldPolicy,
        cause: Option<ErrorRepresentation>,
        now: Timestamp,
        outermost: bool,
    ) -> ErrorRepresentation {
        let meta = self.resolver.resolve(failure, ctx.handler.as_ref(), policy);

        let mut rep = ErrorRepresentation::new(meta.status);
        rep.status_text = Some(meta.status_text);
        rep.timestamp = Some(now);
        if outermost {
            rep.id = Some(
                ctx.correlation_id
                    .clone()
                    .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            );
        }

        if policy.include_message {
            rep.message = Some(meta.message);
        }
        if policy.include_exception_type {
            rep.exception_type = Some(failure.type_name().into_owned());
        }
        if policy.include_application {
            rep.application = Some(self.config.application.clone());
        }
        if policy.include_path {
            rep.path = Some(ctx.path.clone());
        }
        if policy.include_handler {
            rep.handler.clone_from(&ctx.handler);
        }
        if policy.include_stack_trace {
            rep.stack_trace = failure.stack_frames().filter(|frames| !frames.is_empty());
        }

        rep.error_code = meta.error_code;
        if let Some(cause) = cause {
            // Inheritance does not depend on whether the cause is exposed
            if rep.error_code.is_none()
                && let Some(code) = cause.error_code.as_ref().filter(|code| !code.is_empty())
            {
                rep.error_code = Some(code.clone());
                rep.error_code_inherited = true;
            }
            if policy.include_cause {
                rep.cause = Some(Box::new(cause));
            }
        }

        rep
    }
}

/// Copy a representation, keeping only the fields a policy permits
///
/// Applies to every nested cause as well. Identifiers, status, and error
/// code are always kept; extensions are opaque to the policy and copied
/// unconditionally.
pub fn reconfigure(rep: &ErrorRepresentation, policy: &FieldPolicy, max_depth: usize) -> ErrorRepresentation {
    // The top level is always gated, whatever the depth limit
    let max_depth = max_depth.max(1);
    let mut levels: Vec<&ErrorRepresentation> = Vec::new();
    let mut current = Some(rep);
    while let Some(level) = current {
        if levels.len() == max_depth {
            tracing::warn!(max_depth, "cause chain truncated while reconfiguring error representation");
            break;
        }
        levels.push(level);
        if !policy.include_cause {
            break;
        }
        current = level.cause.as_deref();
    }

    let mut rebuilt: Option<ErrorRepresentation> = None;
    while let Some(level) = levels.pop() {
        rebuilt = Some(ErrorRepresentation {
            id: level.id.clone(),
            timestamp: level.timestamp,
            status: level.status,
            status_text: level.status_text.clone(),
            error_code: level.error_code.clone(),
            error_code_inherited: level.error_code_inherited,
            message: gate(policy.include_message, &level.message),
            exception_type: gate(policy.include_exception_type, &level.exception_type),
            application: gate(policy.include_application, &level.application),
            path: gate(policy.include_path, &level.path),
            handler: gate(policy.include_handler, &level.handler),
            stack_trace: gate(policy.include_stack_trace, &level.stack_trace),
            cause: rebuilt.map(Box::new),
            extensions: level.extensions.clone(),
        });
    }

    rebuilt.unwrap_or_else(|| rep.clone())
}

fn gate<T: Clone>(include: bool, value: &Option<T>) -> Option<T> {
    if include { value.clone() } else { None }
}
