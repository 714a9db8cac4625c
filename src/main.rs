//! `ecoguard` - Session guard for the eco platform admin and user sites.
//!
//! Copyright (C) 2026 The ecoguard authors
//! SPDX-License-Identifier: AGPL-3.0-only
//!
//! Initializes logging, loads configuration, builds the shared session store,
//! and launches one guarding proxy per application.

use ecoguard::{App, Config, GuardProxy, SessionStore};

use pingora::proxy::http_proxy_service;
use pingora::server::Server;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() {
    dotenvy::dotenv().ok();

    let (non_blocking, log_guard) = tracing_appender::non_blocking(std::io::stdout());
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "json".to_string());

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(non_blocking);

    if log_format.eq_ignore_ascii_case("pretty") {
        subscriber.init();
    } else {
        subscriber.json().init();
    }

    let config = Config::from_env();
    let store = match SessionStore::new(&config) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            error!(error = %e, "Session store misconfigured");
            eprintln!("ecoguard: {e}");
            // Flush buffered log lines; `exit` skips destructors.
            drop(log_guard);
            std::process::exit(1);
        }
    };

    info!(
        admin_listen = %config.admin.listen_addr,
        admin_backend = %config.admin.backend_url,
        user_listen = %config.user.listen_addr,
        user_backend = %config.user.backend_url,
        admin_hosts = ?config.admin_hosts,
        trust_forwarded_for = config.trust_forwarded_for,
        log_format = %config.log_format,
        "Server initialized"
    );

    let mut server = Server::new(None).expect("Failed to create Pingora server");
    server.bootstrap();

    for app in [App::Admin, App::User] {
        let proxy = GuardProxy::new(app, config.clone(), store.clone());
        let mut service = http_proxy_service(&server.configuration, proxy);
        service.add_tcp(&app.settings(&config).listen_addr.to_string());
        server.add_service(service);
    }

    server.run_forever();
}
