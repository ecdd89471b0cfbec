//! End-to-end protocol exchange against a loopback engine process.
//!
//! The fixture engine speaks the wire protocol directly (newline-delimited
//! JSON values) rather than reusing the crate's message types, so these
//! tests would catch an encoding drift between client and wire.

#![expect(
    clippy::expect_used,
    reason = "loopback fixtures panic on setup failure"
)]

use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::path::Path;
use std::thread;
use std::time::Duration;

use serde_json::{Value, json};

use specmark_engine::{
    ConnectionPool, EngineConfig, InMemoryImplementationIndex, ResolveError, StepResolution,
    StepResolver,
};

/// Serve the protocol on an ephemeral port, one thread per accepted
/// connection; step values normalize to the request text unchanged.
/// Returns the port to connect to.
fn spawn_engine(catalog: &[(&str, &str)]) -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind loopback listener");
    let port = listener.local_addr().expect("listener address").port();
    let steps: Vec<Value> = catalog
        .iter()
        .map(|(value, display)| json!({"stepValue": value, "parameterizedStepValue": display}))
        .collect();
    let _server = thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(stream) = stream else {
                return;
            };
            let steps = steps.clone();
            thread::spawn(move || serve_connection(stream, &steps));
        }
    });
    port
}

/// Answer requests on one accepted connection until the peer closes it.
fn serve_connection(stream: TcpStream, steps: &[Value]) {
    let Ok(read_half) = stream.try_clone() else {
        return;
    };
    let mut reader = BufReader::new(read_half);
    let mut writer = stream;
    let mut line = String::new();
    loop {
        line.clear();
        match reader.read_line(&mut line) {
            Ok(0) | Err(_) => return,
            Ok(_) => {}
        }
        let Ok(request) = serde_json::from_str::<Value>(&line) else {
            return;
        };
        let id = request.get("messageId").cloned().unwrap_or(Value::Null);
        let kind = request
            .get("messageType")
            .and_then(Value::as_str)
            .unwrap_or_default();
        let reply = if kind == "GetStepValueRequest" {
            let text = request
                .pointer("/stepValueRequest/stepText")
                .and_then(Value::as_str)
                .unwrap_or_default();
            json!({
                "messageId": id,
                "messageType": "GetStepValueResponse",
                "stepValueResponse": {"stepValue": {"stepValue": text}},
            })
        } else {
            json!({
                "messageId": id,
                "messageType": "GetAllStepsResponse",
                "allStepsResponse": {"steps": steps},
            })
        };
        if writer.write_all(reply.to_string().as_bytes()).is_err() {
            return;
        }
        if writer.write_all(b"\n").is_err() {
            return;
        }
    }
}

/// Accept a connection and never answer, leaving the client to time out.
fn spawn_silent_engine() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind loopback listener");
    let port = listener.local_addr().expect("listener address").port();
    let _server = thread::spawn(move || {
        let _held = listener.accept();
        thread::sleep(Duration::from_secs(30));
    });
    port
}

#[test]
fn resolves_catalog_steps_over_tcp() {
    let port = spawn_engine(&[("Sign in as admin", "Sign in as <role>")]);
    let config = EngineConfig::default()
        .with_port(port)
        .with_request_timeout_ms(2_000);
    let pool = ConnectionPool::new(config);
    let connection = pool
        .connection_for(Path::new("/project"))
        .expect("connect to loopback engine");
    let mut guard = connection
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    let index = InMemoryImplementationIndex::new();
    let mut resolver = StepResolver::new(&mut *guard, &index);

    let resolution = resolver
        .resolve("Sign in as admin")
        .expect("engine is reachable");
    assert_eq!(
        resolution,
        StepResolution::Known {
            parameterized_value: "Sign in as <role>".to_string(),
        }
    );

    let resolution = resolver
        .resolve("Completely unknown step")
        .expect("engine is reachable");
    assert_eq!(resolution, StepResolution::Unimplemented);
}

#[test]
fn pool_reuses_the_connection_per_project_root() {
    let port = spawn_engine(&[]);
    let config = EngineConfig::default()
        .with_port(port)
        .with_request_timeout_ms(2_000);
    let pool = ConnectionPool::new(config);
    let first = pool
        .connection_for(Path::new("/project"))
        .expect("connect to loopback engine");
    let second = pool
        .connection_for(Path::new("/project"))
        .expect("reuse pooled connection");
    assert!(std::sync::Arc::ptr_eq(&first, &second));
}

#[test]
fn pool_reconnects_after_eviction() {
    let port = spawn_engine(&[("Sign in as admin", "Sign in as <role>")]);
    let config = EngineConfig::default()
        .with_port(port)
        .with_request_timeout_ms(2_000);
    let pool = ConnectionPool::new(config);
    let root = Path::new("/project");
    let first = pool
        .connection_for(root)
        .expect("connect to loopback engine");
    {
        let mut guard = first
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let index = InMemoryImplementationIndex::new();
        let mut resolver = StepResolver::new(&mut *guard, &index);
        resolver
            .resolve("Sign in as admin")
            .expect("engine is reachable");
    }

    pool.evict(root);

    let second = pool
        .connection_for(root)
        .expect("reconnect after eviction");
    assert!(!std::sync::Arc::ptr_eq(&first, &second));
    let mut guard = second
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    let index = InMemoryImplementationIndex::new();
    let mut resolver = StepResolver::new(&mut *guard, &index);
    let resolution = resolver
        .resolve("Sign in as admin")
        .expect("fresh connection reaches the engine");
    assert_eq!(
        resolution,
        StepResolution::Known {
            parameterized_value: "Sign in as <role>".to_string(),
        }
    );
}

#[test]
fn silent_engine_times_out_as_unavailable() {
    let port = spawn_silent_engine();
    let config = EngineConfig::default()
        .with_port(port)
        .with_request_timeout_ms(100);
    let pool = ConnectionPool::new(config);
    let connection = pool
        .connection_for(Path::new("/project"))
        .expect("connect to loopback engine");
    let mut guard = connection
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    let index = InMemoryImplementationIndex::new();
    let mut resolver = StepResolver::new(&mut *guard, &index);

    let error = resolver
        .resolve("Sign in as admin")
        .expect_err("silent engine must not resolve");
    assert!(matches!(error, ResolveError::Unavailable(_)));
}
