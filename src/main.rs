use std::process::ExitCode;
use std::time::Duration;

use tokio::sync::oneshot;

use tg_dispatch::config::{self, Config};
use tg_dispatch::prelude::*;

fn register_demo_handlers(bot: &mut Dispatcher) {
    bot.register_command("start", |ctx| {
        let keyboard = inline_keyboard(vec![vec![
            InlineButton::new("Yes").callback_data("answer:yes"),
            InlineButton::new("No").callback_data("answer:no"),
        ]]);
        let greeting = format!(
            "Hello, {}! Do you like this bot?",
            format_user_name(ctx.from_user())
        );
        ctx.bot()
            .send_message(&greeting, SendOptions::new().reply_markup(keyboard))?;
        Ok(())
    })
    .register_command("stop", |ctx| {
        ctx.reply("Shutting down")?;
        ctx.bot().stop();
        Ok(())
    })
    .register_message_handler(|ctx| {
        ctx.reply(ctx.text())?;
        Ok(())
    })
    .register_photo_handler(|ctx| {
        let url = ctx.photo_url()?;
        if url.is_empty() {
            ctx.reply("Could not fetch this photo")?;
            return Ok(());
        }
        let size = ctx.best_photo();
        let caption = format!(
            "{}x{}",
            size.get("width").and_then(|v| v.as_u64()).unwrap_or(0),
            size.get("height").and_then(|v| v.as_u64()).unwrap_or(0),
        );
        ctx.bot()
            .send_photo(&url, PhotoOptions::new().caption(caption))?;
        Ok(())
    })
    .register_callback_handler(|ctx| {
        let choice = ctx.data().trim_start_matches("answer:");
        ctx.answer(CallbackAnswer::new().text(format!("You picked {}", choice)))?;
        ctx.edit_message_reply_markup(None)?;
        Ok(())
    });
}

async fn run(ctx: BootstrapRequirements) -> UResult {
    let interval = Duration::from_secs(ctx.config.poll_interval_secs);
    let timeout = ctx.config.poll_timeout_secs;
    let logger = ctx.logger.clone();
    let signal_logger = ctx.logger.clone();
    let (handle_tx, handle_rx) = oneshot::channel::<StopHandle>();

    // The blocking HTTP client has to be created and dropped off the runtime
    let worker = tokio::task::spawn_blocking(move || -> UResult {
        let mut poller = bootstrap(ctx)?;
        register_demo_handlers(poller.dispatcher_mut());
        info!(logger, "Handlers registered";
            "commands" => poller.dispatcher().command_names().join(","),
        );
        let _ = handle_tx.send(poller.stop_handle());
        poller.start(interval, timeout)?;
        Ok(())
    });

    let signals = tokio::spawn(async move {
        if let Ok(stop_handle) = handle_rx.await {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!(signal_logger, "Interrupt received, stopping after the current fetch");
                stop_handle.stop();
            }
        }
    });

    let outcome = worker.await;
    signals.abort();
    outcome?
}

fn load_config(cfg_path: &str) -> Result<Config, ExitCode> {
    config::read_or_create(cfg_path).map_err(|why| {
        let logger = configure_term_root();
        crit!(logger, "Could not load the configuration";
            "path" => cfg_path,
            "reason" => why.to_string(),
        );
        ExitCode::FAILURE
    })
}

#[tokio::main]
async fn main() -> ExitCode {
    let cfg_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| config::DEFAULT_CONFIG_PATH.to_owned());
    let config = match load_config(&cfg_path) {
        Ok(v) => v,
        Err(code) => return code,
    };

    let logger = configure_root(&config).unwrap_or_else(|why| {
        let logger = configure_term_root();
        warn!(logger, "Falling back to the terminal logger"; "reason" => why.to_string());
        logger
    });

    let ctx = BootstrapRequirements {
        logger: logger.clone(),
        config,
    };
    match run(ctx).await {
        Ok(()) => {
            info!(logger, "Bot stopped");
            ExitCode::SUCCESS
        }
        Err(why) => {
            crit!(logger, "Bot terminated"; "reason" => why.to_string());
            ExitCode::FAILURE
        }
    }
}
