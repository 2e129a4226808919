use crate::config;
use crate::prelude::*;

#[derive(Clone)]
pub struct BootstrapRequirements {
    pub logger: slog::Logger,
    pub config: config::Config,
}

fn introduce_self(ctx: &BootstrapRequirements) {
    info!(ctx.logger, "Starting telegram bot dispatcher";
        "api_host" => &ctx.config.api_host,
        "api_port" => ctx.config.api_port,
        "version" => config::PACKAGE_VERSION,
    );
}

fn extract_token(ctx: &BootstrapRequirements) -> UResult<String> {
    match std::env::var(&ctx.config.token_var) {
        Ok(token) if !token.trim().is_empty() => Ok(token.trim().to_owned()),
        Ok(_) => {
            crit!(ctx.logger, "The API token variable is empty";
                "env token" => &ctx.config.token_var,
            );
            Err(format!("{} is empty", ctx.config.token_var).into())
        }
        Err(why) => {
            crit!(
                ctx.logger,
                "Could not fetch the API token from the environment";
                "env token" => &ctx.config.token_var,
                "reason" => why.to_string(),
            );
            Err(why.into())
        }
    }
}

fn instantiate_transport(ctx: &BootstrapRequirements) -> UResult<HttpsTransport> {
    let token = extract_token(ctx)?;
    debug!(ctx.logger, "API token fetched");

    let tls_config = match create_client_config(&ctx.config) {
        Ok(v) => v,
        Err(why) => {
            crit!(ctx.logger, "Could not instantiate a valid TLS config";
                "ca_bundle" => ctx.config.ca_bundle_path.display().to_string(),
                "reason" => why.to_string(),
            );
            return Err(why);
        }
    };
    info!(ctx.logger, "TLS config successfully initialized");

    let transport = HttpsTransport::new()
        .host(ctx.config.api_host.as_str())
        .port(ctx.config.api_port)
        .token(token)
        .tls_config(tls_config)
        .logger(ctx.logger.clone())
        .build()?;
    Ok(transport)
}

/// Wires configuration, logger and transport into a poller with an empty
/// handler registry
pub fn bootstrap(ctx: BootstrapRequirements) -> UResult<Poller> {
    introduce_self(&ctx);

    let transport = instantiate_transport(&ctx)?;
    let dispatcher = Dispatcher::new()
        .logger(ctx.logger.clone())
        .transport(transport)
        .build()?;
    let poller = Poller::new()
        .logger(ctx.logger.clone())
        .dispatcher(dispatcher)
        .build()?;
    info!(ctx.logger, "Bot instantiated");
    Ok(poller)
}
