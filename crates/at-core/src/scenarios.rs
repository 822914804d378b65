//! The scripted demo scenarios behind each command.
//!
//! Every scenario is a straight-line sequence of gauge writes, log lines and
//! waits on one task. Concurrent pieces (`download`, `corrida`, `todas`) are
//! joined on the same task, so session writes never overlap.

use std::pin::pin;

use at_protocol::GaugeKind::{Cpu, Memory, Network};
use at_protocol::LineKind;
use at_sim::{
    all_settled, operation_progress, race, Dice, OperationSpec, ProgressEvent, ScriptedTimer,
    Settlement, SimError, TimeScale,
};
use futures::StreamExt;
use thiserror::Error;

use crate::command::Command;
use crate::session::Session;

/// Baseline CPU after most scenarios.
const CPU_IDLE: f64 = 15.0;

pub const ADMIN_USER: &str = "admin";
pub const ADMIN_PASSWORD: &str = "1234";

pub const HELP_LINES: &[&str] = &[
    "Comandos disponíveis:",
    "• servidor - Testar requisição ao servidor",
    "• idade [número] - Validar idade",
    "• download - Baixar arquivos",
    "• login [usuário] [senha] - Tentativa de login",
    "• usuario - Buscar dados do usuário",
    "• contar [número] - Contar com delay",
    "• corrida - Demo de corrida entre timers (race)",
    "• todas - Demo de espera por todos os timers (all settled)",
    "• limpar - Limpar terminal",
];

/// Unexpected failures inside a scenario.
#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("simulação: {0}")]
    Sim(#[from] SimError),
}

/// Everything a scenario may touch.
pub struct ScenarioContext<'a> {
    pub session: &'a Session,
    pub dice: &'a dyn Dice,
    pub scale: TimeScale,
}

impl ScenarioContext<'_> {
    fn info(&self, text: impl Into<String>) {
        self.session.emit(text, LineKind::Info);
    }

    fn success(&self, text: impl Into<String>) {
        self.session.emit(text, LineKind::Success);
    }

    fn error(&self, text: impl Into<String>) {
        self.session.emit(text, LineKind::Error);
    }

    async fn wait(&self, ms: u64) {
        self.scale.sleep_ms(ms).await;
    }
}

/// Run the scenario for `command` to completion.
pub async fn run(command: &Command, ctx: &ScenarioContext<'_>) -> Result<(), ScenarioError> {
    match command {
        Command::Server => server(ctx).await,
        Command::Age(age) => check_age(ctx, *age).await,
        Command::Download => download(ctx).await,
        Command::Login { username, password } => login(ctx, username, password).await,
        Command::UserProfile => user_profile(ctx).await,
        Command::Count(n) => count(ctx, *n).await,
        Command::Race => timer_race(ctx).await,
        Command::AllSettled => settle_all(ctx).await,
        Command::Help => {
            help(ctx);
            Ok(())
        }
        Command::Clear => {
            ctx.session.clear_log();
            Ok(())
        }
    }
}

/// Run one simulated operation and report its weighted random outcome.
///
/// The operation leaves the active set before the outcome is drawn. A broken
/// draw still counts as a failure before the error propagates.
pub async fn simulate_operation(
    ctx: &ScenarioContext<'_>,
    spec: OperationSpec,
) -> Result<bool, ScenarioError> {
    let id = ctx.session.begin_operation();
    let mut progress = pin!(operation_progress(&spec, ctx.scale));
    while let Some(event) = progress.next().await {
        match event {
            ProgressEvent::Started => ctx.info(format!("🚀 Iniciando {}...", spec.name)),
            ProgressEvent::Progress(pct) => {
                ctx.info(format!("⏳ {} progresso: {pct}%", spec.name))
            }
            ProgressEvent::Completed => {}
        }
    }
    ctx.session.end_operation(id);

    let succeeded = match ctx.dice.succeeds(spec.success_rate) {
        Ok(succeeded) => succeeded,
        Err(e) => {
            ctx.session.record_outcome(false);
            return Err(e.into());
        }
    };

    if succeeded {
        ctx.success(format!("✅ {} concluído com sucesso!", spec.name));
    } else {
        ctx.error(format!("❌ {} falhou!", spec.name));
    }
    ctx.session.record_outcome(succeeded);
    tracing::debug!(operation = %spec.name, succeeded, "simulated operation finished");
    Ok(succeeded)
}

async fn server(ctx: &ScenarioContext<'_>) -> Result<(), ScenarioError> {
    ctx.session.set_metrics(&[(Cpu, 60.0), (Network, 80.0)]);
    simulate_operation(ctx, OperationSpec::new("Requisição ao Servidor", 2000, 0.9)).await?;
    ctx.session.set_metrics(&[(Cpu, 20.0), (Network, 10.0)]);
    Ok(())
}

async fn check_age(ctx: &ScenarioContext<'_>, age: u32) -> Result<(), ScenarioError> {
    ctx.session.set_metric(Cpu, 30.0);
    ctx.info(format!("🔍 Validando idade: {age}..."));
    ctx.wait(1000).await;
    if age >= 18 {
        ctx.success(format!("🔓 Acesso liberado para idade {age}"));
    } else {
        ctx.error(format!("🚫 Acesso negado para idade {age}"));
    }
    ctx.session.set_metric(Cpu, CPU_IDLE);
    Ok(())
}

async fn download(ctx: &ScenarioContext<'_>) -> Result<(), ScenarioError> {
    ctx.session.set_metrics(&[(Network, 90.0), (Memory, 70.0)]);
    let (image, video) = futures::join!(
        simulate_operation(ctx, OperationSpec::new("Download da Imagem", 2000, 0.95)),
        simulate_operation(ctx, OperationSpec::new("Download do Vídeo", 3000, 0.85)),
    );
    let all_ok = image? && video?;
    if all_ok {
        ctx.success("📊 Downloads concluídos: Todos bem-sucedidos");
    } else {
        ctx.session
            .emit("📊 Downloads concluídos: Alguns falharam", LineKind::Warning);
    }
    ctx.session.set_metrics(&[(Network, 15.0), (Memory, 35.0)]);
    Ok(())
}

async fn login(
    ctx: &ScenarioContext<'_>,
    username: &str,
    password: &str,
) -> Result<(), ScenarioError> {
    ctx.session.set_metric(Cpu, 40.0);
    ctx.info(format!("🔐 Autenticando {username}..."));
    ctx.wait(1500).await;
    if username == ADMIN_USER && password == ADMIN_PASSWORD {
        ctx.success(format!("✅ Login bem-sucedido para {username}"));
    } else {
        ctx.error(format!("❌ Credenciais inválidas para {username}"));
    }
    ctx.session.set_metric(Cpu, CPU_IDLE);
    Ok(())
}

async fn user_profile(ctx: &ScenarioContext<'_>) -> Result<(), ScenarioError> {
    ctx.session.set_metrics(&[(Cpu, 50.0), (Memory, 60.0)]);
    ctx.info("👤 Buscando dados do usuário...");
    ctx.wait(1000).await;
    ctx.success("📋 Usuário: Will (ID: 5)");
    ctx.info("🛍️ Buscando pedidos...");
    ctx.wait(1500).await;
    ctx.success("📦 Pedido 101: Camiseta");
    ctx.success("📦 Pedido 102: Tênis");
    ctx.session.set_metrics(&[(Cpu, CPU_IDLE), (Memory, 35.0)]);
    Ok(())
}

async fn count(ctx: &ScenarioContext<'_>, n: u32) -> Result<(), ScenarioError> {
    ctx.session.set_metric(Cpu, 25.0);
    for i in 1..=n {
        ctx.info(format!("📢 Contagem: {i}"));
        ctx.wait(1000).await;
    }
    ctx.success("🎯 Contagem finalizada!");
    ctx.session.set_metric(Cpu, CPU_IDLE);
    Ok(())
}

/// The scripted delays make the timeout settle first every time.
async fn timer_race(ctx: &ScenarioContext<'_>) -> Result<(), ScenarioError> {
    ctx.session.set_metrics(&[(Cpu, 70.0), (Network, 60.0)]);
    ctx.info("🏁 Iniciando corrida entre timers...");
    let timers = vec![
        ScriptedTimer::fulfill(2000, "Dados encontrados"),
        ScriptedTimer::reject(1000, "Tempo esgotado"),
    ];
    match race(timers, ctx.scale).await? {
        Settlement::Fulfilled(value) => ctx.success(format!("🏆 Vencedor da corrida: {value}")),
        Settlement::Rejected(reason) => ctx.error(format!("⏰ Resultado da corrida: {reason}")),
    }
    ctx.session.set_metrics(&[(Cpu, CPU_IDLE), (Network, 10.0)]);
    Ok(())
}

async fn settle_all(ctx: &ScenarioContext<'_>) -> Result<(), ScenarioError> {
    ctx.session.set_metric(Cpu, 80.0);
    ctx.info("🔄 Aguardando todos os timers (all settled)...");
    let timers = vec![
        ScriptedTimer::fulfill(1000, "Sucesso 1s"),
        ScriptedTimer::reject(2000, "Erro 2s"),
        ScriptedTimer::fulfill(500, "Sucesso 0.5s"),
    ];
    for (i, settlement) in all_settled(timers, ctx.scale).await.iter().enumerate() {
        match settlement {
            Settlement::Fulfilled(value) => ctx.success(format!("✅ Timer {}: {value}", i + 1)),
            Settlement::Rejected(reason) => ctx.error(format!("❌ Timer {}: {reason}", i + 1)),
        }
    }
    ctx.session.set_metric(Cpu, CPU_IDLE);
    Ok(())
}

fn help(ctx: &ScenarioContext<'_>) {
    for line in HELP_LINES {
        ctx.session.emit_static(*line, LineKind::Info);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use at_sim::ScriptedDice;
    use std::time::Duration;
    use tokio::time::Instant;

    fn ctx<'a>(session: &'a Session, dice: &'a dyn Dice) -> ScenarioContext<'a> {
        ScenarioContext {
            session,
            dice,
            scale: TimeScale::default(),
        }
    }

    fn texts(session: &Session) -> Vec<String> {
        session.lines().into_iter().map(|l| l.text).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn operation_reports_progress_then_success() {
        let session = Session::new();
        let dice = ScriptedDice::always_succeed();
        let ok = simulate_operation(&ctx(&session, &dice), OperationSpec::new("Teste", 1000, 0.5))
            .await
            .unwrap();

        assert!(ok);
        assert_eq!(
            texts(&session),
            vec![
                "🚀 Iniciando Teste...",
                "⏳ Teste progresso: 0%",
                "⏳ Teste progresso: 30%",
                "⏳ Teste progresso: 60%",
                "⏳ Teste progresso: 90%",
                "✅ Teste concluído com sucesso!",
            ]
        );
        assert_eq!(session.counters().succeeded, 1);
        assert_eq!(session.active_operations(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn operation_failure_counts_once() {
        let session = Session::new();
        let dice = ScriptedDice::always_fail();
        let ok = simulate_operation(&ctx(&session, &dice), OperationSpec::new("X", 100, 0.9))
            .await
            .unwrap();

        assert!(!ok);
        let last = session.lines().pop().unwrap();
        assert_eq!(last.kind, LineKind::Error);
        assert_eq!(last.text, "❌ X falhou!");
        let c = session.counters();
        assert_eq!((c.succeeded, c.failed), (0, 1));
    }

    #[tokio::test(start_paused = true)]
    async fn broken_draw_counts_as_failure_and_errors() {
        let session = Session::new();
        let dice = ScriptedDice::constant(-1.0);
        let result =
            simulate_operation(&ctx(&session, &dice), OperationSpec::new("X", 100, 0.9)).await;

        assert!(matches!(
            result,
            Err(ScenarioError::Sim(SimError::InvalidDraw(_)))
        ));
        assert_eq!(session.counters().failed, 1);
        assert_eq!(session.active_operations(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn download_runs_both_concurrently() {
        let session = Session::new();
        let dice = ScriptedDice::always_succeed();
        let start = Instant::now();
        run(&Command::Download, &ctx(&session, &dice)).await.unwrap();

        // Concurrent: the longer 3000ms download bounds the total.
        assert_eq!(start.elapsed(), Duration::from_millis(3000));
        let last = session.lines().pop().unwrap();
        assert_eq!(last.text, "📊 Downloads concluídos: Todos bem-sucedidos");
        assert_eq!(session.counters().succeeded, 2);
        assert_eq!(session.metric(Network), 15.0);
        assert_eq!(session.metric(Memory), 35.0);
    }

    #[tokio::test(start_paused = true)]
    async fn download_partial_failure_warns() {
        let session = Session::new();
        // Image draws first and succeeds, video fails.
        let dice = ScriptedDice::new([0.1, 0.9], 0.0);
        run(&Command::Download, &ctx(&session, &dice)).await.unwrap();

        let last = session.lines().pop().unwrap();
        assert_eq!(last.kind, LineKind::Warning);
        assert_eq!(last.text, "📊 Downloads concluídos: Alguns falharam");
        let c = session.counters();
        assert_eq!((c.succeeded, c.failed), (1, 1));
    }

    #[tokio::test(start_paused = true)]
    async fn user_profile_takes_two_waits() {
        let session = Session::new();
        let dice = ScriptedDice::always_succeed();
        let start = Instant::now();
        run(&Command::UserProfile, &ctx(&session, &dice)).await.unwrap();

        assert_eq!(start.elapsed(), Duration::from_millis(2500));
        assert_eq!(
            texts(&session),
            vec![
                "👤 Buscando dados do usuário...",
                "📋 Usuário: Will (ID: 5)",
                "🛍️ Buscando pedidos...",
                "📦 Pedido 101: Camiseta",
                "📦 Pedido 102: Tênis",
            ]
        );
        assert_eq!(session.metric(Cpu), 15.0);
        assert_eq!(session.metric(Memory), 35.0);
    }

    #[tokio::test]
    async fn help_is_immediate_and_static() {
        let session = Session::new();
        let dice = ScriptedDice::always_succeed();
        run(&Command::Help, &ctx(&session, &dice)).await.unwrap();

        let lines = session.lines();
        assert_eq!(lines.len(), HELP_LINES.len());
        assert!(lines.iter().all(|l| l.kind == LineKind::Info && !l.animated));
    }

    #[tokio::test(start_paused = true)]
    async fn server_restores_metrics() {
        let session = Session::new();
        let dice = ScriptedDice::always_succeed();
        run(&Command::Server, &ctx(&session, &dice)).await.unwrap();

        assert_eq!(session.metric(Cpu), 20.0);
        assert_eq!(session.metric(Network), 10.0);
        assert_eq!(session.counters().succeeded, 1);
    }
}
