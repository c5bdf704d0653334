mod common;

use anyhow::{ensure, Context, Result};
use ducklet::{ConnectionFacade, FacadeError, QueryParams, Row, Value};

use common::{captured_facade, text};

fn seeded_facade() -> Result<ConnectionFacade> {
    let mut facade = ConnectionFacade::in_memory();
    facade.connect()?;
    facade.execute_query(
        "CREATE TABLE people AS SELECT * FROM (VALUES \
         (1, 'ada', 36.5), (2, 'grace', NULL), (3, 'linus', 21.0)) AS v(id, name, score)",
    )?;
    Ok(facade)
}

#[test]
fn rows_share_the_result_column_list() -> Result<()> {
    let mut facade = seeded_facade()?;
    let result = facade.execute_query("SELECT name, id FROM people ORDER BY id")?;

    ensure!(result.columns() == ["name", "id"]);
    ensure!(result.len() == 3);
    for row in &result {
        ensure!(row.columns() == result.columns());
    }
    let first = result.first().context("missing first row")?;
    ensure!(first.get("name") == Some(&text("ada")));
    Ok(())
}

#[test]
fn statements_without_result_columns_return_empty_sets() -> Result<()> {
    let mut facade = seeded_facade()?;
    facade.execute_query("CREATE TABLE empty_one (id INTEGER)")?;
    let result = facade.execute_query("SELECT * FROM empty_one")?;
    ensure!(result.is_empty());
    ensure!(result.columns() == ["id"]);
    Ok(())
}

#[test]
fn streaming_matches_eager_execution() -> Result<()> {
    let mut facade = seeded_facade()?;
    let sql = "SELECT id, name, score FROM people ORDER BY id";
    let eager = facade.execute_query(sql)?.into_rows();

    let mut stream = facade.execute_query_streaming(sql)?;
    ensure!(stream.columns() == ["id", "name", "score"]);
    let streamed = stream.by_ref().collect::<ducklet::Result<Vec<Row>>>()?;
    ensure!(stream.rows_yielded() == 3);
    ensure!(stream.next().is_none());
    drop(stream);

    ensure!(streamed == eager);
    Ok(())
}

#[test]
fn large_results_stream_across_chunks() -> Result<()> {
    let mut facade = ConnectionFacade::in_memory();
    facade.connect()?;
    let mut expected = 0i64;
    let mut count = 0usize;
    for row in facade.execute_query_streaming("SELECT range AS n FROM range(5000)")? {
        let row = row?;
        ensure!(row.get("n") == Some(&Value::BigInt(expected)));
        expected += 1;
        count += 1;
    }
    ensure!(count == 5000);
    Ok(())
}

#[test]
fn abandoned_stream_leaves_the_connection_usable() -> Result<()> {
    let (mut facade, logs) = captured_facade();
    facade.connect()?;

    {
        let mut stream = facade.execute_query_streaming("SELECT range AS n FROM range(10000)")?;
        let first = stream.next().context("stream ended early")??;
        ensure!(first.get("n") == Some(&Value::BigInt(0)));
    }

    let result = facade.execute_query("SELECT 1 AS one")?;
    ensure!(result.first().and_then(|row| row.get("one")) == Some(&Value::Int(1)));
    ensure!(logs.contents().contains("row stream dropped before exhaustion"));
    Ok(())
}

#[test]
fn named_and_positional_parameters_agree() -> Result<()> {
    let mut facade = seeded_facade()?;

    let positional = facade.execute_query_with_params(
        "SELECT name FROM people WHERE id >= ? AND name <> ? ORDER BY id",
        QueryParams::positional([Value::Int(2), text("linus")]),
    )?;
    let named = facade.execute_query_with_params(
        "SELECT name FROM people WHERE id >= $min_id AND name <> $skip ORDER BY id",
        QueryParams::named([("skip", text("linus")), ("$min_id", Value::Int(2))]),
    )?;

    ensure!(positional.len() == 1);
    ensure!(positional.rows() == named.rows());
    Ok(())
}

#[test]
fn unknown_named_parameter_is_an_execution_error() -> Result<()> {
    let mut facade = seeded_facade()?;
    let err = facade
        .execute_query_with_params(
            "SELECT name FROM people WHERE id = $id",
            QueryParams::named([("nope", Value::Int(1))]),
        )
        .unwrap_err();
    ensure!(matches!(err, FacadeError::Execution(_)), "got {err:?}");
    Ok(())
}

#[test]
fn failing_query_keeps_the_engine_message_and_logs_the_statement() -> Result<()> {
    let (mut facade, logs) = captured_facade();
    facade.connect()?;

    let sql = "SELECT * FROM table_that_does_not_exist";
    let err = facade.execute_query(sql).unwrap_err();
    let FacadeError::Query(engine) = &err else {
        anyhow::bail!("expected a query error, got {err:?}");
    };
    ensure!(engine.to_string().contains("table_that_does_not_exist"));
    ensure!(err.to_string().contains(&engine.to_string()));

    let captured = logs.contents();
    ensure!(captured.contains("query failed"));
    ensure!(captured.contains(sql));
    Ok(())
}

#[test]
fn null_bytes_in_sql_are_rejected() -> Result<()> {
    let mut facade = ConnectionFacade::in_memory();
    facade.connect()?;
    let err = facade.execute_query("SELECT 1;\0").unwrap_err();
    ensure!(matches!(err, FacadeError::Validation(_)));
    Ok(())
}

#[test]
fn results_with_repeated_column_names_are_refused() -> Result<()> {
    let mut facade = ConnectionFacade::in_memory();
    facade.connect()?;
    match facade.execute_query("SELECT 1 AS a, 2 AS a") {
        Err(err) => ensure!(matches!(err, FacadeError::Validation(_)), "got {err:?}"),
        // The engine may already rename one of them.
        Ok(result) => {
            let columns = result.columns();
            ensure!(columns.len() == 2 && columns[0] != columns[1], "got {columns:?}");
        }
    }
    ensure!(facade.execute_query("SELECT 1 AS a, 2 AS b")?.len() == 1);
    Ok(())
}
