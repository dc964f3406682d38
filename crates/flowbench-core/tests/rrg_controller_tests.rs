use async_trait::async_trait;
use flowbench_core::{
    ConnectionParams, DeviceLink, FlowLink, FlowLinkFactory, LinkError, RrgController, RrgError,
};
use std::sync::{Arc, Mutex};

// --- Scripted link with fault injection ---

#[derive(Debug, Clone, PartialEq)]
enum Command {
    Connect,
    Close,
    SetFlow(f64),
    GetFlow,
    SetGas(u16),
}

#[derive(Default)]
struct Faults {
    // Number of times each operation should fail before succeeding
    connect: usize,
    set_flow: usize,
    get_flow: usize,
    set_gas: usize,
}

struct Bench {
    faults: Mutex<Faults>,
    flow: Mutex<f64>,
    log: Mutex<Vec<Command>>,
}

impl Bench {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            faults: Mutex::new(Faults::default()),
            flow: Mutex::new(0.0),
            log: Mutex::new(Vec::new()),
        })
    }

    fn take_fault(counter: &mut usize) -> bool {
        if *counter > 0 {
            *counter -= 1;
            true
        } else {
            false
        }
    }

    fn record(&self, command: Command) {
        self.log.lock().unwrap().push(command);
    }

    fn commands(&self) -> Vec<Command> {
        self.log.lock().unwrap().clone()
    }
}

struct ScriptedFlowLink {
    params: ConnectionParams,
    bench: Arc<Bench>,
    open: bool,
}

#[async_trait]
impl DeviceLink for ScriptedFlowLink {
    async fn connect(&mut self) -> Result<(), LinkError> {
        self.bench.record(Command::Connect);
        if Bench::take_fault(&mut self.bench.faults.lock().unwrap().connect) {
            return Err(LinkError::PortOpen {
                port: self.params.port.clone(),
                detail: "scripted failure".into(),
            });
        }
        self.open = true;
        Ok(())
    }

    async fn close(&mut self) {
        self.bench.record(Command::Close);
        self.open = false;
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn params(&self) -> &ConnectionParams {
        &self.params
    }
}

#[async_trait]
impl FlowLink for ScriptedFlowLink {
    async fn set_flow(&mut self, sccm: f64) -> Result<(), LinkError> {
        self.bench.record(Command::SetFlow(sccm));
        if Bench::take_fault(&mut self.bench.faults.lock().unwrap().set_flow) {
            return Err(LinkError::Timeout(50));
        }
        *self.bench.flow.lock().unwrap() = sccm;
        Ok(())
    }

    async fn get_flow(&mut self) -> Result<f64, LinkError> {
        self.bench.record(Command::GetFlow);
        if Bench::take_fault(&mut self.bench.faults.lock().unwrap().get_flow) {
            return Err(LinkError::Transport("scripted read failure".into()));
        }
        Ok(*self.bench.flow.lock().unwrap())
    }

    async fn set_gas(&mut self, gas_id: u16) -> Result<(), LinkError> {
        self.bench.record(Command::SetGas(gas_id));
        if Bench::take_fault(&mut self.bench.faults.lock().unwrap().set_gas) {
            return Err(LinkError::Exception("IllegalDataValue".into()));
        }
        Ok(())
    }
}

struct ScriptedFlowFactory {
    bench: Arc<Bench>,
}

impl FlowLinkFactory for ScriptedFlowFactory {
    fn flow_link(&self, params: ConnectionParams) -> Box<dyn FlowLink> {
        Box::new(ScriptedFlowLink {
            params,
            bench: self.bench.clone(),
            open: false,
        })
    }
}

fn rrg_params() -> ConnectionParams {
    ConnectionParams::new("/dev/ttyUSB0", 38400, 1, 50)
}

fn controller(bench: &Arc<Bench>) -> RrgController {
    RrgController::new(Arc::new(ScriptedFlowFactory {
        bench: bench.clone(),
    }))
}

// --- Tests ---

#[tokio::test]
async fn test_setpoint_round_trip() {
    let bench = Bench::new();
    let mut rrg = controller(&bench);

    rrg.turn_on(rrg_params()).await.unwrap();
    rrg.set_flow(12.5).await.unwrap();
    assert_eq!(rrg.get_flow().await.unwrap(), 12.5);
    rrg.turn_off().await.unwrap();

    assert_eq!(
        bench.commands(),
        vec![
            Command::Connect,
            Command::SetFlow(12.5),
            Command::GetFlow,
            Command::Close
        ]
    );
    assert!(rrg.is_disconnected());
}

#[tokio::test]
async fn test_connect_failure_leaves_controller_disconnected() {
    let bench = Bench::new();
    bench.faults.lock().unwrap().connect = 1;
    let mut rrg = controller(&bench);

    let result = rrg.turn_on(rrg_params()).await;
    assert!(matches!(
        result,
        Err(RrgError::ConnectFailed(LinkError::PortOpen { .. }))
    ));
    assert!(rrg.is_disconnected());
    // The failed link never held the port, so no close is issued.
    assert_eq!(bench.commands(), vec![Command::Connect]);
    assert!(matches!(rrg.last_error(), Some(LinkError::PortOpen { .. })));
}

#[tokio::test]
async fn test_command_failure_keeps_session_open() {
    let bench = Bench::new();
    bench.faults.lock().unwrap().set_flow = 1;
    let mut rrg = controller(&bench);

    rrg.turn_on(rrg_params()).await.unwrap();
    assert_eq!(
        rrg.set_flow(5.0).await,
        Err(RrgError::SetFlowFailed(LinkError::Timeout(50)))
    );
    assert!(rrg.is_connected());

    // Retry succeeds on the same session.
    rrg.set_flow(5.0).await.unwrap();
    assert_eq!(rrg.get_flow().await.unwrap(), 5.0);
}

#[tokio::test]
async fn test_error_variants_match_operation() {
    let bench = Bench::new();
    {
        let mut faults = bench.faults.lock().unwrap();
        faults.get_flow = 1;
        faults.set_gas = 1;
    }
    let mut rrg = controller(&bench);

    rrg.turn_on(rrg_params()).await.unwrap();
    assert_eq!(
        rrg.get_flow().await,
        Err(RrgError::GetFlowFailed(LinkError::Transport(
            "scripted read failure".into()
        )))
    );
    assert_eq!(
        rrg.set_gas(7).await,
        Err(RrgError::SetGasFailed(LinkError::Exception(
            "IllegalDataValue".into()
        )))
    );
    assert_eq!(
        rrg.last_error(),
        Some(&LinkError::Exception("IllegalDataValue".into()))
    );
}

#[tokio::test]
async fn test_reconnect_replaces_open_session() {
    let bench = Bench::new();
    let mut rrg = controller(&bench);

    rrg.turn_on(rrg_params()).await.unwrap();
    rrg.turn_on(rrg_params()).await.unwrap();

    assert!(rrg.is_connected());
    assert_eq!(
        bench.commands(),
        vec![Command::Connect, Command::Close, Command::Connect]
    );
}

#[tokio::test]
async fn test_negative_substitute_reading_passes_through() {
    // A real register pair decodes unsigned and cannot go negative, but a
    // substitute link can report one; the controller must not reinterpret it.
    let bench = Bench::new();
    *bench.flow.lock().unwrap() = -1.0;
    let mut rrg = controller(&bench);

    rrg.turn_on(rrg_params()).await.unwrap();
    assert_eq!(rrg.get_flow().await.unwrap(), -1.0);
}

#[tokio::test]
async fn test_commands_after_turn_off_are_rejected() {
    let bench = Bench::new();
    let mut rrg = controller(&bench);

    rrg.turn_on(rrg_params()).await.unwrap();
    rrg.turn_off().await.unwrap();

    assert_eq!(rrg.set_flow(1.0).await, Err(RrgError::NotConnected));
    assert_eq!(rrg.get_flow().await, Err(RrgError::NotConnected));
    assert_eq!(rrg.turn_off().await, Err(RrgError::NotConnected));
    // Rejected commands never reach the device.
    assert_eq!(bench.commands(), vec![Command::Connect, Command::Close]);
}

#[tokio::test]
async fn test_last_error_survives_disconnect() {
    let bench = Bench::new();
    bench.faults.lock().unwrap().get_flow = 1;
    let mut rrg = controller(&bench);

    rrg.turn_on(rrg_params()).await.unwrap();
    let _ = rrg.get_flow().await;
    rrg.turn_off().await.unwrap();

    assert_eq!(
        rrg.last_error(),
        Some(&LinkError::Transport("scripted read failure".into()))
    );
}
