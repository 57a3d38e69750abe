use graphql_exec::{
    ArgumentDefinition, Context, ExecutionRequest, FieldDefinition, FieldError, ObjectType, Schema,
    TypeRef, Value, spawn_execution,
};
use serde_json::json;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let schema = match build_schema() {
        Ok(schema) => schema,
        Err(err) => panic!("user_store schema is invalid: {err}"),
    };

    let cases = [
        DemoCase {
            name: "lookup",
            source: r#"{ user(id: "1") { id name } }"#,
            expected_errors: 0,
        },
        DemoCase {
            name: "missing_user",
            source: r#"{ user(id: "404") { id name } }"#,
            expected_errors: 0,
        },
        DemoCase {
            name: "failing_resolver",
            source: r#"{ user(id: "1") { name nickname } }"#,
            expected_errors: 1,
        },
        DemoCase {
            name: "unknown_field",
            source: r#"{ user(id: "1") { age } }"#,
            expected_errors: 1,
        },
        DemoCase {
            name: "syntax_error",
            source: r#"{ user(id: "1") { name }"#,
            expected_errors: 1,
        },
    ];

    let mut failures = 0usize;
    for case in cases {
        if !run_case(&schema, case).await {
            failures += 1;
        }
    }

    println!("\n=== spawned ===");
    let handle = spawn_execution(
        ExecutionRequest::new(schema.clone(), r#"{ user(id: "2") { name } }"#)
            .with_context(Context::new(store())),
    );
    println!("{}", handle.await.to_json());

    if failures > 0 {
        panic!("user_store demo detected {failures} failing case(s)");
    }
}

struct DemoCase {
    name: &'static str,
    source: &'static str,
    expected_errors: usize,
}

async fn run_case(schema: &Schema, case: DemoCase) -> bool {
    println!("\n=== {} ===", case.name);
    println!("source: {}", case.source);

    let result = ExecutionRequest::new(schema.clone(), case.source)
        .with_context(Context::new(store()))
        .execute()
        .await;
    println!("{}", result.to_json());

    let passed = result.errors.len() == case.expected_errors;
    if passed {
        println!("PASS");
    } else {
        println!(
            "FAIL (expected errors={}; got errors={})",
            case.expected_errors,
            result.errors.len()
        );
    }
    passed
}

fn store() -> Value {
    Value::from(json!({
        "1": {"id": "1", "name": "Ada"},
        "2": {"id": "2", "name": "Grace"},
    }))
}

fn build_schema() -> Result<Schema, graphql_exec::SchemaError> {
    let user = ObjectType::new("User")
        .field(FieldDefinition::new("id", TypeRef::named("String")))
        .field(FieldDefinition::new("name", TypeRef::named("String")))
        .field(
            FieldDefinition::new("nickname", TypeRef::named("String"))
                .resolve_with(|_| Err(FieldError::new("boom"))),
        );
    let query = ObjectType::new("Query").field(
        FieldDefinition::new("user", TypeRef::named("User"))
            .argument(ArgumentDefinition::new("id", TypeRef::named("String")))
            .resolve_with(|params| {
                let store = params
                    .context
                    .data::<Value>()
                    .ok_or_else(|| FieldError::new("user store missing"))?;
                let id = params.arg("id").and_then(Value::as_str).unwrap_or_default();
                Ok(store.get(id).cloned().unwrap_or(Value::Null))
            }),
    );
    Schema::build(query, None, [user.into()])
}
