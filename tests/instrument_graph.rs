// ==============================================
// INSTRUMENTED OBJECT GRAPH TESTS (integration)
// ==============================================
//
// Drives a mock driver graph through wrapped objects and checks the timers
// the orchestrator leaves behind. Every scenario runs once per synthesis
// strategy.

mod common;

use std::sync::Arc;

use common::{
    Journal, MockConnection, MockDataSource, MockXaConnection, MockXaDataSource, RowsKind,
};
use probekit::builder::InstrumenterBuilder;
use probekit::driver::{
    CachedRowSet, CallableStatement, Capability, Connection, DataSource, DriverObject, JoinRowSet,
    PooledConnection, PreparedStatement, ResultSet, Statement, WebRowSet, Wrapper, XaConnection,
    XaDataSource, XaResource,
};
use probekit::instrument::Instrumenter;
use probekit::monitor::{StopwatchRegistry, StopwatchSample};
use probekit::proxy::SynthesisStrategy;

const STRATEGIES: [SynthesisStrategy; 3] = [
    SynthesisStrategy::Reflective,
    SynthesisStrategy::CachedReflective,
    SynthesisStrategy::ClassSynthesis,
];

const SAMPLE_ID: &str = "select_d90991bb8c08a7c17c78439f05c47413a4ceb7cb";
const BY_ID_ID: &str = "select_0efff369e5047a4b9fe9379c3b929b01dbca35a4";
const ORDERED_ID: &str = "select_0e6401e07280dd48ed998834c17ebe0db1d31e51";
const INSERT_CALL_ID: &str = "call_6f3e6f742a8d21e69aa9fa604e6623da814e8580";

fn setup(strategy: SynthesisStrategy) -> (Arc<StopwatchRegistry>, Instrumenter) {
    let registry = Arc::new(StopwatchRegistry::new());
    let instrumenter = InstrumenterBuilder::new()
        .monitor(registry.clone())
        .strategy(strategy)
        .identifier_cache_size(Some(64))
        .build();
    (registry, instrumenter)
}

fn connect(
    instrumenter: &Instrumenter,
    rows: RowsKind,
) -> (Arc<dyn Connection>, Arc<dyn Connection>) {
    let real: Arc<dyn Connection> = Arc::new(MockConnection::new(Journal::default(), rows));
    let wrapped = instrumenter.wrap_connection("svc", real.clone()).unwrap();
    (real, wrapped)
}

fn sample(registry: &StopwatchRegistry, name: &str) -> StopwatchSample {
    registry
        .sample(name)
        .unwrap_or_else(|| panic!("no timer named {name}; have {:?}", registry.names()))
}

// ==============================================
// Lifetime timers
// ==============================================

mod lifetimes {
    use super::*;

    #[test]
    fn statement_lifetime_is_timed_under_stmt() {
        for strategy in STRATEGIES {
            let (registry, instrumenter) = setup(strategy);
            let (_, connection) = connect(&instrumenter, RowsKind::Plain);
            assert_eq!(sample(&registry, "svc.conn").active, 1);

            let statement = connection.create_statement().unwrap();
            assert_eq!(sample(&registry, "svc.stmt").active, 1, "{strategy}");

            statement.close().unwrap();
            let stmt = sample(&registry, "svc.stmt");
            assert_eq!((stmt.active, stmt.counter), (0, 1), "{strategy}");
            assert!(statement.is_closed().unwrap());

            connection.close().unwrap();
            assert_eq!(sample(&registry, "svc.conn").active, 0);
        }
    }

    #[test]
    fn double_close_stops_timer_once() {
        for strategy in STRATEGIES {
            let (registry, instrumenter) = setup(strategy);
            let (_, connection) = connect(&instrumenter, RowsKind::Plain);
            connection.close().unwrap();
            connection.close().unwrap();
            let conn = sample(&registry, "svc.conn");
            assert_eq!((conn.active, conn.counter), (0, 1), "{strategy}");
        }
    }

    #[test]
    fn data_source_connections_are_wrapped_under_its_name() {
        for strategy in STRATEGIES {
            let (registry, instrumenter) = setup(strategy);
            let data_source = instrumenter
                .wrap_data_source("ds", Arc::new(MockDataSource::new(RowsKind::Plain)))
                .unwrap();
            let connection = data_source.get_connection().unwrap();
            assert_eq!(sample(&registry, "ds.conn").active, 1, "{strategy}");

            connection.create_statement().unwrap().close().unwrap();
            assert_eq!(sample(&registry, "ds.stmt").counter, 1);
            // data sources have no lifetime timer of their own
            assert_eq!(registry.names(), vec!["ds.conn".to_string(), "ds.stmt".to_string()]);
        }
    }

    #[test]
    fn xa_connections_time_pooled_and_logical_lifetimes() {
        for strategy in STRATEGIES {
            let (registry, instrumenter) = setup(strategy);
            let data_source = instrumenter
                .wrap_xa_data_source("xa", Arc::new(MockXaDataSource::default()))
                .unwrap();
            let xa = data_source.get_xa_connection().unwrap();
            assert_eq!(sample(&registry, "xa.pooledconn").active, 1, "{strategy}");

            let logical = xa.get_connection().unwrap();
            assert_eq!(sample(&registry, "xa.conn").active, 1);
            assert!(xa.get_xa_resource().unwrap().prepare("xid-1").is_ok());

            logical.close().unwrap();
            xa.close().unwrap();
            assert_eq!(sample(&registry, "xa.conn").active, 0);
            assert_eq!(sample(&registry, "xa.pooledconn").active, 0);
        }
    }

    #[test]
    fn pooled_connection_close_reaches_real_object() {
        let (registry, instrumenter) = setup(SynthesisStrategy::ClassSynthesis);
        let real = Arc::new(MockXaConnection::new(Journal::default()));
        let pooled = instrumenter.wrap_pooled_connection("pool", real.clone()).unwrap();
        assert_eq!(sample(&registry, "pool.pooledconn").active, 1);
        pooled.close().unwrap();
        assert!(real.is_closed());
        assert_eq!(sample(&registry, "pool.pooledconn").counter, 1);
    }
}

// ==============================================
// Execution timers
// ==============================================

mod executions {
    use super::*;

    #[test]
    fn same_query_on_two_statements_shares_exec_timer() {
        for strategy in STRATEGIES {
            let (registry, instrumenter) = setup(strategy);
            let (_, connection) = connect(&instrumenter, RowsKind::Plain);
            let sql = "select * from sample";

            for _ in 0..2 {
                let statement = connection.create_statement().unwrap();
                let rows = statement.execute_query(sql).unwrap();
                rows.close().unwrap();
                statement.close().unwrap();
            }

            let exec = sample(&registry, &format!("svc.{SAMPLE_ID}.exec"));
            assert_eq!(exec.counter, 2, "{strategy}");
            assert_eq!(exec.active, 0);
            assert_eq!(exec.note.as_deref(), Some(sql));
            assert_eq!(sample(&registry, &format!("svc.{SAMPLE_ID}.rset")).counter, 2);
        }
    }

    #[test]
    fn prepared_statement_uses_identifier_from_preparation() {
        for strategy in STRATEGIES {
            let (registry, instrumenter) = setup(strategy);
            let (_, connection) = connect(&instrumenter, RowsKind::Plain);
            let sql = "select * from sample where id=?";

            let statement = connection.prepare_statement(sql).unwrap();
            let stmt = sample(&registry, &format!("svc.{BY_ID_ID}.stmt"));
            assert_eq!(stmt.active, 1, "{strategy}");
            assert_eq!(stmt.note.as_deref(), Some(sql));

            let _ = statement.set_int(1, 42);
            let rows = statement.execute_query_prepared().unwrap();
            assert!(statement.execute_prepared().unwrap());
            assert_eq!(statement.execute_update_prepared().unwrap(), 1);
            assert_eq!(sample(&registry, &format!("svc.{BY_ID_ID}.exec")).counter, 3);
            assert_eq!(sample(&registry, &format!("svc.{BY_ID_ID}.rset")).active, 1);

            rows.close().unwrap();
            statement.close().unwrap();
            assert_eq!(sample(&registry, &format!("svc.{BY_ID_ID}.rset")).active, 0);
            assert_eq!(sample(&registry, &format!("svc.{BY_ID_ID}.stmt")).active, 0);
        }
    }

    #[test]
    fn explicit_query_text_overrides_prepared_identifier() {
        let (registry, instrumenter) = setup(SynthesisStrategy::Reflective);
        let (_, connection) = connect(&instrumenter, RowsKind::Plain);
        let statement = connection
            .prepare_statement("select * from sample where id=?")
            .unwrap();
        statement
            .execute_update("select id,name from sample order by id asc")
            .unwrap();
        assert_eq!(sample(&registry, &format!("svc.{ORDERED_ID}.exec")).counter, 1);
        assert!(registry.sample(&format!("svc.{BY_ID_ID}.exec")).is_none());
    }

    #[test]
    fn callable_statement_is_timed_and_passes_through() {
        for strategy in STRATEGIES {
            let (registry, instrumenter) = setup(strategy);
            let (_, connection) = connect(&instrumenter, RowsKind::Plain);
            let call = connection.prepare_call("{call INSERT_SAMPLE(?,?)}").unwrap();
            assert_eq!(call.get_out_string(1).unwrap().as_deref(), Some("out"));
            call.execute_prepared().unwrap();
            assert_eq!(
                sample(&registry, &format!("svc.{INSERT_CALL_ID}.exec")).counter,
                1,
                "{strategy}"
            );
            call.close().unwrap();
            assert_eq!(sample(&registry, &format!("svc.{INSERT_CALL_ID}.stmt")).counter, 1);
            assert_eq!(
                sample(&registry, &format!("svc.{INSERT_CALL_ID}.stmt")).note.as_deref(),
                Some("{call INSERT_SAMPLE(?,?)}")
            );
        }
    }

    #[test]
    fn failed_execution_is_still_timed_and_error_passes_through() {
        for strategy in STRATEGIES {
            let (registry, instrumenter) = setup(strategy);
            let (_, connection) = connect(&instrumenter, RowsKind::Plain);
            let statement = connection.create_statement().unwrap();
            let sql = "select * from missing_table";
            let err = statement.execute(sql).unwrap_err();
            assert_eq!(err.sql_state(), Some("42S02"), "{strategy}");

            let exec = sample(&registry, &format!("svc.{}.exec", instrumenter.build_sql_id(sql)));
            assert_eq!((exec.active, exec.counter), (0, 1));
        }
    }

    #[test]
    fn failed_preparation_starts_no_timer() {
        let (registry, instrumenter) = setup(SynthesisStrategy::CachedReflective);
        let (_, connection) = connect(&instrumenter, RowsKind::Plain);
        let err = connection.prepare_statement("   ").err().unwrap();
        assert_eq!(err.sql_state(), Some("42000"));
        assert_eq!(registry.names(), vec!["svc.conn".to_string()]);
    }

    #[test]
    fn untimed_calls_pass_straight_through() {
        for strategy in STRATEGIES {
            let (registry, instrumenter) = setup(strategy);
            let (_, connection) = connect(&instrumenter, RowsKind::Plain);
            connection.set_auto_commit(false).unwrap();
            assert!(!connection.auto_commit().unwrap());
            assert_eq!(registry.len(), 1, "{strategy}");
        }
    }
}

// ==============================================
// Result-set resolution
// ==============================================

mod result_sets {
    use super::*;

    #[test]
    fn join_row_set_is_wrapped_as_join_row_set() {
        for strategy in STRATEGIES {
            let (_, instrumenter) = setup(strategy);
            let (_, connection) = connect(&instrumenter, RowsKind::Join);
            let statement = connection.create_statement().unwrap();
            let rows = statement.execute_query("select * from sample").unwrap();

            let join = rows.clone().into_join_row_set().expect("join view");
            assert_eq!(join.where_clause().unwrap(), "a.id = b.id");
            assert_eq!(join.size().unwrap(), 2);
            assert!(rows.clone().into_filtered_row_set().is_none(), "{strategy}");
            assert!(rows.clone().into_jdbc_row_set().is_none());
            assert!(rows.is_wrapper_for(Capability::JoinRowSet).unwrap());
        }
    }

    #[test]
    fn filtered_row_set_wins_over_web_row_set() {
        let (_, instrumenter) = setup(SynthesisStrategy::ClassSynthesis);
        let (_, connection) = connect(&instrumenter, RowsKind::Filtered);
        let rows = connection
            .create_statement()
            .unwrap()
            .execute_query("select * from sample")
            .unwrap();
        assert!(rows.clone().into_filtered_row_set().is_some());
        assert!(rows.clone().into_join_row_set().is_none());
        assert_eq!(rows.clone().into_web_row_set().unwrap().write_xml().unwrap(), "<webRowSet/>");
    }

    #[test]
    fn plain_result_set_offers_no_row_set_views() {
        let (_, instrumenter) = setup(SynthesisStrategy::Reflective);
        let (_, connection) = connect(&instrumenter, RowsKind::Plain);
        let rows = connection
            .create_statement()
            .unwrap()
            .execute_query("select * from sample")
            .unwrap();
        assert!(rows.next().unwrap());
        assert!(rows.get_string(1).unwrap().is_some());
        assert!(rows.clone().into_row_set().is_none());
    }
}

// ==============================================
// Wrapper protocol
// ==============================================

mod unwrapping {
    use super::*;

    #[test]
    fn unwrap_to_declared_capability_yields_real_object() {
        for strategy in STRATEGIES {
            let (_, instrumenter) = setup(strategy);
            let (real, connection) = connect(&instrumenter, RowsKind::Plain);

            assert!(connection.is_wrapper_for(Capability::Connection).unwrap());
            let unwrapped = connection.unwrap_to(Capability::Connection).unwrap();
            assert!(unwrapped.same_object(&DriverObject::Connection(real.clone())), "{strategy}");
            assert!(!unwrapped.same_object(&DriverObject::Connection(connection.clone())));
        }
    }

    #[test]
    fn other_capabilities_are_asked_of_the_real_object() {
        let (_, instrumenter) = setup(SynthesisStrategy::CachedReflective);
        let (_, connection) = connect(&instrumenter, RowsKind::Plain);
        assert!(!connection.is_wrapper_for(Capability::Statement).unwrap());
        let err = connection.unwrap_to(Capability::Statement).unwrap_err();
        assert_eq!(err.sql_state(), Some("HY000"));
    }

    #[test]
    fn wrapped_statements_unwrap_to_real_statements() {
        let (_, instrumenter) = setup(SynthesisStrategy::ClassSynthesis);
        let (_, connection) = connect(&instrumenter, RowsKind::Plain);
        let statement = connection.prepare_statement("select 1").unwrap();
        let unwrapped = statement.unwrap_to(Capability::PreparedStatement).unwrap();
        assert_eq!(unwrapped.capability(), Capability::PreparedStatement);
        assert!(unwrapped.as_prepared_statement().is_some());
    }
}
