// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! resbroker server - Main entry point.

use anyhow::Result;
use log::info;
use resbroker_azure_storage::Config;
use resbroker_core::{Context, OsEnv};
use resbroker_http_send_reqwest::ReqwestHttpSend;
use resbroker_server::{create_router, AppState, DEFAULT_ADDR, RESBROKER_ADDR};

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine.
    let _ = dotenv::dotenv();
    env_logger::init();

    let ctx = Context::new()
        .with_env(OsEnv)
        .with_http_send(ReqwestHttpSend::default());

    let config = Config::default().from_env(&ctx)?;
    let broker = config.build_broker(ctx.clone())?;
    info!(
        "issuing tokens for storage account {}",
        config.account_name.as_deref().unwrap_or_default()
    );

    let addr = ctx
        .env_var(RESBROKER_ADDR)
        .unwrap_or_else(|| DEFAULT_ADDR.to_string());
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("listening on {addr}");

    axum::serve(listener, create_router(AppState::new(broker)))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        log::error!("failed to listen for shutdown signal: {err}");
    }
    info!("shutting down");
}
