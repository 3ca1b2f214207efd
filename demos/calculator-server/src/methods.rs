//! Calculator methods, including every method the JSON-RPC 2.0 specification
//! examples call.

use std::time::Duration;

use async_trait::async_trait;
use json_rpc_engine::prelude::*;
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

/// Every method the server exposes.
pub fn registry() -> MethodRegistry {
    MethodRegistry::new()
        .with_fn("subtract", subtract)
        .with_fn("sum", sum)
        .with_fn("divide", divide)
        .with_fn("get_data", |ctx| ctx.set_result(("hello", 5)))
        .with_fn("update", log_call)
        .with_fn("notify_hello", log_call)
        .with_fn("notify_sum", log_call)
        .with_method("sleep", Delay)
}

#[derive(Debug, thiserror::Error)]
enum CalcError {
    #[error("division by zero")]
    DivisionByZero,
}

impl ToJsonRpcError for CalcError {
    fn to_error_object(&self) -> JsonRpcErrorObject {
        match self {
            CalcError::DivisionByZero => {
                JsonRpcErrorObject::server_error(-32001).with_message(self.to_string())
            }
        }
    }
}

/// `subtract` accepts `[minuend, subtrahend]` or `{"minuend": .., "subtrahend": ..}`
fn subtract(ctx: &mut RequestContext) {
    let operands = match ctx.params().kind() {
        ParamsKind::Named => ctx
            .params()
            .i64("minuend")
            .and_then(|a| Ok((a, ctx.params().i64("subtrahend")?))),
        _ => ctx
            .params()
            .i64_at(0)
            .and_then(|a| Ok((a, ctx.params().i64_at(1)?))),
    };
    ctx.set_outcome(operands.map(|(a, b)| a - b));
}

/// Integer sum while every operand is an integer, floating point otherwise.
fn sum(ctx: &mut RequestContext) {
    let params = ctx.params();
    let total = if params.iter().all(Value::is_i64) {
        params
            .iter()
            .filter_map(Value::as_i64)
            .try_fold(0i64, i64::checked_add)
            .map(Value::from)
    } else {
        None
    };
    let total = match total {
        Some(total) => Ok(total),
        None => (0..params.len())
            .map(|index| params.f64_at(index))
            .sum::<Result<f64, ParamsError>>()
            .map(Value::from),
    };
    ctx.set_outcome(total);
}

/// Logs the call; answers `null` when invoked with an id.
fn log_call(ctx: &mut RequestContext) {
    info!("{} called with {}", ctx.method(), ctx.params().to_value());
    ctx.set_result(());
}

#[derive(Deserialize)]
struct Division {
    dividend: f64,
    divisor: f64,
}

fn divide(ctx: &mut RequestContext) {
    let division: Division = match ctx.params().deserialize() {
        Ok(division) => division,
        Err(err) => return ctx.set_error(err),
    };
    if division.divisor == 0.0 {
        return ctx.set_domain_error(&CalcError::DivisionByZero);
    }
    ctx.set_result(division.dividend / division.divisor);
}

/// Waits `params[0]` milliseconds before answering; handy for watching batch ordering.
struct Delay;

#[async_trait]
impl MethodHandler for Delay {
    async fn handle(&self, ctx: &mut RequestContext) {
        let millis = match ctx.params().get_at::<u64>(0) {
            Ok(millis) => millis,
            Err(err) => return ctx.set_error(err),
        };
        tokio::time::sleep(Duration::from_millis(millis)).await;
        ctx.set_result(millis);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn server() -> JsonRpcServer {
        JsonRpcServer::new(registry())
    }

    async fn call(request: &str) -> Value {
        let response = server().handle_str(request).await;
        serde_json::from_slice(response.body.as_deref().unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_sum_of_integers_stays_integer() {
        let response = server()
            .handle_str(r#"{"jsonrpc":"2.0","method":"sum","params":[1,2,4],"id":"1"}"#)
            .await;
        assert_eq!(
            response.body_str(),
            Some(r#"{"jsonrpc":"2.0","result":7,"id":"1"}"#)
        );
    }

    #[tokio::test]
    async fn test_sum_with_fractions() {
        assert_eq!(
            call(r#"{"jsonrpc":"2.0","method":"sum","params":[1.5,2],"id":1}"#).await["result"],
            json!(3.5)
        );
        assert_eq!(
            call(r#"{"jsonrpc":"2.0","method":"sum","params":[1,"x"],"id":1}"#).await["error"]["code"],
            json!(-32602)
        );
    }

    #[tokio::test]
    async fn test_notification_methods_answer_null_when_called_with_an_id() {
        for method in ["update", "notify_hello", "notify_sum"] {
            let request = json!({"jsonrpc": "2.0", "method": method, "params": [1], "id": 1});
            assert_eq!(
                call(&request.to_string()).await,
                json!({"jsonrpc": "2.0", "result": null, "id": 1}),
                "method: {}",
                method
            );
        }
    }

    #[tokio::test]
    async fn test_notification_methods_stay_silent() {
        let response = server()
            .handle_str(r#"[{"jsonrpc":"2.0","method":"notify_sum","params":[1,2,4]},{"jsonrpc":"2.0","method":"notify_hello","params":[7]}]"#)
            .await;
        assert!(!response.has_body());
    }

    #[tokio::test]
    async fn test_subtract_and_get_data() {
        assert_eq!(
            call(r#"{"jsonrpc":"2.0","method":"subtract","params":{"subtrahend":23,"minuend":42},"id":3}"#).await,
            json!({"jsonrpc": "2.0", "result": 19, "id": 3})
        );
        assert_eq!(
            call(r#"{"jsonrpc":"2.0","method":"get_data","id":"9"}"#).await,
            json!({"jsonrpc": "2.0", "result": ["hello", 5], "id": "9"})
        );
    }

    #[tokio::test]
    async fn test_divide_by_zero_is_a_server_error() {
        assert_eq!(
            call(r#"{"jsonrpc":"2.0","method":"divide","params":{"dividend":1,"divisor":0},"id":1}"#).await,
            json!({"jsonrpc": "2.0", "error": {"code": -32001, "message": "division by zero"}, "id": 1})
        );
    }
}
