use crate::report::{
    self,
    ReportOptions,
};
use chrono::Utc;
use color_eyre::Result;
use content_pipeline_config::{
    Args,
    Config,
    WorkspaceRegistry,
};
use content_pipeline_metrics::{
    DashboardView,
    LinearClient,
    MetricsOptions,
    Orchestrator,
    RefreshController,
    RefreshSettings,
    SourceContext,
    SystemClock,
};
use eyre::{
    bail,
    Context,
};
use std::{
    path::PathBuf,
    time::Duration,
};
use tokio::time::MissedTickBehavior;

type Controller = RefreshController<Orchestrator<LinearClient>>;

/// Shortest pause between two refresh attempts in watch mode.
const MIN_WATCH_TICK: Duration = Duration::from_secs(60);

pub struct App {
    config: Config,
    registry: WorkspaceRegistry,
    force: bool,
    watch: bool,
    list_workspaces: bool,
    show_config: bool,
    output_file: Option<PathBuf>,
    report_options: ReportOptions,
}

impl App {
    pub fn new(args: Args) -> Result<Self> {
        let config = Config::new(args.clone())?;
        config.validate()?;
        let registry = WorkspaceRegistry::from_config(&config);

        Ok(Self {
            config,
            registry,
            force: args.force,
            watch: args.watch,
            list_workspaces: args.list_workspaces,
            show_config: args.show_config,
            output_file: args.output_file,
            report_options: ReportOptions {
                all_authors: args.all_authors,
            },
        })
    }

    pub async fn run(self) -> Result<()> {
        if self.show_config {
            print!("{}", self.config.to_yaml()?);
            return Ok(());
        }
        if self.list_workspaces {
            print!("{}", report::workspaces(&self.registry));
            return Ok(());
        }

        let workspace = self.config.initial_workspace();
        if !self.registry.is_known(&workspace) {
            let known = self
                .registry
                .list_workspaces()
                .into_iter()
                .map(|ws| ws.id)
                .collect::<Vec<_>>();
            bail!("unknown workspace {workspace:?}, expected one of {}", known.join(", "));
        }
        if self.registry.active_workspaces().is_empty() {
            warn!("no workspace has an API key, see --list-workspaces");
        }

        let controller = self.controller()?;
        info!(workspace = %workspace, "starting content pipeline");

        let mut last = self.refresh(&controller, &workspace, self.force).await;
        self.publish(&last).await?;

        if self.watch {
            let tick = (self.config.refresh_interval / 4).max(MIN_WATCH_TICK);
            info!(every = %humantime::format_duration(tick), "watching for changes, press ctrl-c to stop");

            let mut interval = tokio::time::interval(tick);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // the first tick completes immediately
            interval.tick().await;

            let shutdown = tokio::signal::ctrl_c();
            tokio::pin!(shutdown);
            loop {
                tokio::select! {
                    result = &mut shutdown => {
                        result.wrap_err("failed to listen for ctrl-c")?;
                        info!("shutting down");
                        break;
                    }
                    _ = interval.tick() => {
                        let view = self.refresh(&controller, &workspace, false).await;
                        if view != last {
                            self.publish(&view).await?;
                            last = view;
                        }
                    }
                }
            }
        }

        Ok(())
    }

    fn controller(&self) -> Result<Controller> {
        let client = LinearClient::new(self.config.api_url.clone(), self.config.request_timeout)
            .wrap_err("failed to create issue tracker client")?;
        let context = SourceContext::new(client, self.registry.clone()).with_page_size(self.config.page_size);
        let orchestrator = Orchestrator::new(context, MetricsOptions::from_config(&self.config));
        let settings = RefreshSettings::from_config(&self.config)?;
        Ok(RefreshController::new(orchestrator, SystemClock, settings))
    }

    /// A rate limit is not fatal: the view then carries the banner and whatever data was cached before.
    async fn refresh(&self, controller: &Controller, workspace: &str, force: bool) -> DashboardView {
        match controller.refresh(workspace, force).await {
            Ok(view) => view,
            Err(err) => {
                warn!(workspace, detail = %err.detail, "{err}");
                controller.view(workspace)
            }
        }
    }

    async fn publish(&self, view: &DashboardView) -> Result<()> {
        match &self.output_file {
            Some(output_file) => {
                let json = report::to_json(view, Utc::now())?;
                tokio::fs::write(output_file, json)
                    .await
                    .wrap_err_with(|| format!("failed to write {}", output_file.display()))?;
                info!("Data exported successfully to {}", output_file.display());
            }
            None => {
                let name = self
                    .registry
                    .list_workspaces()
                    .into_iter()
                    .find(|ws| ws.id == view.workspace)
                    .map(|ws| ws.name)
                    .unwrap_or_else(|| view.workspace.clone());
                println!("{}", report::render(view, &name, self.report_options));
            }
        }
        Ok(())
    }
}
