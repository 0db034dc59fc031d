// ABOUTME: Integration tests for deploy orchestration against in-memory fakes.
// ABOUTME: Covers dependency order, once-per-run builds, the wait protocol, and confirmation.

mod support;

use std::time::Duration;
use strata::deploy::{DeployError, DeployRun, ErrorCategory};
use strata::diagnostics::{Diagnostics, WarningKind};
use strata::remote::WriteOutcome;
use support::{Harness, TEMPLATE, config};

const SLOW: Duration = Duration::from_secs(5);

fn two_tier() -> strata::config::Config {
    config(&format!(
        r#"
stacks:
  app:
    template: {TEMPLATE}
    dependencies: [network]
  network:
    template: {TEMPLATE}
"#
    ))
}

mod ordering {
    use super::*;

    #[tokio::test]
    async fn dependencies_build_first() {
        let h = Harness::new();
        h.stacks.script("app", &["NONEXISTENT", "CREATE_COMPLETE"]);
        h.stacks.script(
            "network",
            &["NONEXISTENT", "CREATE_IN_PROGRESS", "CREATE_COMPLETE"],
        );
        let config = two_tier();

        let run = h
            .builder(SLOW)
            .deploy_stack("app", &config.stacks)
            .await
            .unwrap();

        assert_eq!(h.stacks.written(), vec!["network", "app"]);
        assert_eq!(run.built(), ["network", "app"]);
    }

    #[tokio::test]
    async fn stacks_build_once_per_run() {
        let h = Harness::new();
        h.stacks.script("app", &["NONEXISTENT", "CREATE_COMPLETE"]);
        h.stacks.script("network", &["NONEXISTENT", "CREATE_COMPLETE"]);
        let config = two_tier();
        let builder = h.builder(SLOW);

        let mut run = DeployRun::new();
        builder
            .deploy_in_run(&mut run, "network", &config.stacks)
            .await
            .unwrap();
        builder
            .deploy_in_run(&mut run, "app", &config.stacks)
            .await
            .unwrap();

        assert_eq!(h.stacks.written(), vec!["network", "app"]);
    }

    #[tokio::test]
    async fn build_after_stacks_follow() {
        let h = Harness::new();
        h.stacks.script("app", &["NONEXISTENT", "CREATE_COMPLETE"]);
        h.stacks.script("worker", &["NONEXISTENT", "CREATE_COMPLETE"]);
        let config = config(&format!(
            r#"
stacks:
  app:
    template: {TEMPLATE}
    build_after: [worker]
  worker:
    template: {TEMPLATE}
"#
        ));

        h.builder(SLOW)
            .deploy_stack("app", &config.stacks)
            .await
            .unwrap();
        assert_eq!(h.stacks.written(), vec!["app", "worker"]);
    }

    #[tokio::test]
    async fn ignore_deps_skips_dependencies() {
        let h = Harness::new();
        h.stacks.script("app", &["NONEXISTENT", "CREATE_COMPLETE"]);
        let config = config(&format!(
            r#"
stacks:
  app:
    template: {TEMPLATE}
    dependencies: [network]
    ignore_deps: true
  network:
    template: {TEMPLATE}
"#
        ));

        h.builder(SLOW)
            .deploy_stack("app", &config.stacks)
            .await
            .unwrap();
        assert_eq!(h.stacks.written(), vec!["app"]);
    }

    #[tokio::test]
    async fn unknown_stack_is_reported() {
        let h = Harness::new();
        let config = two_tier();
        let err = h
            .builder(SLOW)
            .deploy_stack("ghost", &config.stacks)
            .await
            .unwrap_err();
        assert!(matches!(err, DeployError::NoSuchStack { .. }));
        assert_eq!(err.category(), ErrorCategory::Configuration);
    }
}

mod sanity {
    use super::*;

    #[tokio::test]
    async fn failed_stack_is_rejected_before_any_write() {
        let h = Harness::new();
        h.stacks.script("app", &["NONEXISTENT"]);
        h.stacks.script("network", &["UPDATE_ROLLBACK_FAILED"]);
        let config = two_tier();

        let err = h
            .builder(SLOW)
            .deploy_stack("app", &config.stacks)
            .await
            .unwrap_err();

        match &err {
            DeployError::StackInFailedState { stack, status } => {
                assert_eq!(stack, "network");
                assert_eq!(status, "UPDATE_ROLLBACK_FAILED");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(err.category(), ErrorCategory::RemoteState);
        assert!(h.stacks.written().is_empty());
    }

    #[tokio::test]
    async fn missing_env_is_rejected_before_any_write() {
        let h = Harness::new();
        let config = config(&format!(
            r#"
stacks:
  app:
    template: {TEMPLATE}
    params:
      Build: {{env: STRATA_DEPLOY_TEST_NEVER_SET}}
"#
        ));

        let err = h
            .builder(SLOW)
            .deploy_stack("app", &config.stacks)
            .await
            .unwrap_err();
        match err {
            DeployError::Env(e) => assert_eq!(e.vars, vec!["STRATA_DEPLOY_TEST_NEVER_SET"]),
            other => panic!("unexpected error: {other}"),
        }
        assert!(h.stacks.written().is_empty());
    }

    #[tokio::test]
    async fn missing_template_file_is_a_document_error() {
        let h = Harness::new();
        let config = config(
            r#"
stacks:
  app:
    template: does/not/exist.json
"#,
        );

        let err = h
            .builder(SLOW)
            .deploy_stack("app", &config.stacks)
            .await
            .unwrap_err();
        assert!(matches!(err, DeployError::Document { .. }));
    }
}

mod waiting {
    use super::*;

    fn single() -> strata::config::Config {
        config(&format!("stacks:\n  app:\n    template: {TEMPLATE}\n"))
    }

    #[tokio::test]
    async fn rollback_is_a_failure() {
        let h = Harness::new();
        h.stacks.script(
            "app",
            &[
                "UPDATE_COMPLETE",
                "UPDATE_IN_PROGRESS",
                "UPDATE_ROLLBACK_IN_PROGRESS",
                "UPDATE_ROLLBACK_COMPLETE",
            ],
        );

        let err = h
            .builder(SLOW)
            .deploy_stack("app", &single().stacks)
            .await
            .unwrap_err();
        assert!(
            matches!(&err, DeployError::RolledBack { status, .. } if status == "UPDATE_ROLLBACK_COMPLETE"),
            "{err}"
        );
    }

    #[tokio::test]
    async fn failed_status_ends_the_wait() {
        let h = Harness::new();
        h.stacks.script(
            "app",
            &["NONEXISTENT", "CREATE_IN_PROGRESS", "CREATE_FAILED"],
        );

        let err = h
            .builder(SLOW)
            .deploy_stack("app", &single().stacks)
            .await
            .unwrap_err();
        assert!(
            matches!(&err, DeployError::StackFailed { status, .. } if status == "CREATE_FAILED"),
            "{err}"
        );
    }

    #[tokio::test]
    async fn nonexistent_is_polled_again() {
        let h = Harness::new();
        h.stacks.script(
            "app",
            &["NONEXISTENT", "NONEXISTENT", "NONEXISTENT", "CREATE_COMPLETE"],
        );

        h.builder(SLOW)
            .deploy_stack("app", &single().stacks)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn times_out_while_in_progress() {
        let h = Harness::new();
        h.stacks.script("app", &["UPDATE_COMPLETE", "UPDATE_IN_PROGRESS"]);

        let err = h
            .builder(Duration::from_millis(30))
            .deploy_stack("app", &single().stacks)
            .await
            .unwrap_err();
        assert!(
            matches!(&err, DeployError::WaitTimeout { status, .. } if status == "UPDATE_IN_PROGRESS"),
            "{err}"
        );
    }

    #[tokio::test]
    async fn rollback_fails_even_when_nothing_changed() {
        for leftover in ["ROLLBACK_COMPLETE", "UPDATE_ROLLBACK_COMPLETE"] {
            let h = Harness::new();
            h.stacks.script("app", &[leftover]);
            h.stacks.set_outcome(WriteOutcome::NoChanges);

            let err = h
                .builder(SLOW)
                .deploy_stack("app", &single().stacks)
                .await
                .unwrap_err();
            assert!(
                matches!(&err, DeployError::RolledBack { status, .. } if status == leftover),
                "{err}"
            );
            assert_eq!(h.stacks.written(), vec!["app"]);
        }
    }
}

mod parameters {
    use super::*;

    #[tokio::test]
    async fn outputs_of_dependencies_become_parameters() {
        let h = Harness::new();
        h.stacks.script("network", &["NONEXISTENT", "CREATE_COMPLETE"]);
        h.stacks.set_outputs("network", &[("VpcId", "vpc-1")]);
        h.stacks.script("app", &["NONEXISTENT", "CREATE_COMPLETE"]);
        let config = config(&format!(
            r#"
stacks:
  app:
    template: {TEMPLATE}
    params:
      VpcId: {{stack: network, output: VpcId}}
      Stage: prod
  network:
    template: {TEMPLATE}
"#
        ));

        h.builder(SLOW)
            .deploy_stack("app", &config.stacks)
            .await
            .unwrap();

        let requests = h.stacks.requests();
        assert_eq!(requests.len(), 2);
        let params: Vec<(String, String)> = requests[1]
            .params
            .iter()
            .map(|p| (p.key.clone(), p.value.clone()))
            .collect();
        assert_eq!(
            params,
            vec![
                ("Stage".to_string(), "prod".to_string()),
                ("VpcId".to_string(), "vpc-1".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn missing_output_is_reported() {
        let h = Harness::new();
        h.stacks.script("network", &["NONEXISTENT", "CREATE_COMPLETE"]);
        h.stacks.script("app", &["NONEXISTENT", "CREATE_COMPLETE"]);
        let config = config(&format!(
            r#"
stacks:
  app:
    template: {TEMPLATE}
    params:
      VpcId: {{stack: network, output: VpcId}}
  network:
    template: {TEMPLATE}
"#
        ));

        let err = h
            .builder(SLOW)
            .deploy_stack("app", &config.stacks)
            .await
            .unwrap_err();
        assert!(matches!(err, DeployError::MissingOutput { .. }), "{err}");
    }

    fn equivalent_when(version: &str) -> (Harness, strata::config::Config) {
        equivalent_in("UPDATE_COMPLETE", version)
    }

    fn equivalent_in(status: &str, version: &str) -> (Harness, strata::config::Config) {
        let h = Harness::new();
        h.stacks.script("app", &[status]);
        h.stacks.set_outputs("app", &[("Version", version)]);
        let config = config(&format!(
            r#"
stacks:
  app:
    template: {TEMPLATE}
    skip_update_if_equivalent:
      - lhs: {{stack: app, output: Version}}
        rhs: "628"
"#
        ));
        (h, config)
    }

    #[tokio::test]
    async fn equivalent_stack_is_not_written() {
        let (h, config) = equivalent_when("628");
        h.builder(SLOW)
            .deploy_stack("app", &config.stacks)
            .await
            .unwrap();
        assert!(h.stacks.written().is_empty());
    }

    #[tokio::test]
    async fn equivalent_stack_left_rolled_back_fails() {
        let (h, config) = equivalent_in("ROLLBACK_COMPLETE", "628");
        let err = h
            .builder(SLOW)
            .deploy_stack("app", &config.stacks)
            .await
            .unwrap_err();
        assert!(matches!(err, DeployError::RolledBack { .. }), "{err}");
        assert!(h.stacks.written().is_empty());
    }

    #[tokio::test]
    async fn differing_stack_is_written() {
        let (h, config) = equivalent_when("627");
        h.builder(SLOW)
            .deploy_stack("app", &config.stacks)
            .await
            .unwrap();
        assert_eq!(h.stacks.written(), vec!["app"]);
    }
}

mod scaling {
    use super::*;

    fn suspending() -> strata::config::Config {
        config(&format!(
            r#"
stacks:
  app:
    template: {TEMPLATE}
    suspend_actions: true
    confirmation:
      auto_scaling_group_id: Asg
      deployment_queue: deployments
      version_message: app
"#
        ))
    }

    #[tokio::test]
    async fn actions_are_resumed_after_a_failed_build() {
        let h = Harness::new();
        h.stacks.set_resource("app", "Asg", "asg-1");
        h.stacks.script(
            "app",
            &["UPDATE_COMPLETE", "UPDATE_IN_PROGRESS", "UPDATE_FAILED"],
        );

        let err = h
            .builder(SLOW)
            .deploy_stack("app", &suspending().stacks)
            .await
            .unwrap_err();

        assert!(matches!(err, DeployError::StackFailed { .. }), "{err}");
        assert_eq!(h.scaling.calls(), vec!["suspend:asg-1", "resume:asg-1"]);
    }

    #[tokio::test]
    async fn build_error_wins_over_resume_error() {
        let h = Harness::new();
        h.stacks.set_resource("app", "Asg", "asg-1");
        h.stacks.script("app", &["UPDATE_IN_PROGRESS", "UPDATE_FAILED"]);
        h.scaling.fail_resume();
        let config = suspending();
        let stack = config.stack("app").unwrap();

        let mut diagnostics = Diagnostics::default();
        let err = h
            .driver(SLOW)
            .build(stack, &config.stacks, &mut diagnostics)
            .await
            .unwrap_err();

        assert!(matches!(err, DeployError::StackFailed { .. }), "{err}");
        assert_eq!(diagnostics.warnings().len(), 1);
        assert_eq!(diagnostics.warnings()[0].kind, WarningKind::ScalingResume);
    }

    #[tokio::test]
    async fn resume_error_fails_a_good_build() {
        let h = Harness::new();
        h.stacks.set_resource("app", "Asg", "asg-1");
        h.stacks.script("app", &["UPDATE_COMPLETE"]);
        h.scaling.fail_resume();
        let config = suspending();
        let stack = config.stack("app").unwrap();

        let err = h
            .driver(SLOW)
            .build(stack, &config.stacks, &mut Diagnostics::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DeployError::Scaling(_)), "{err}");
    }
}

mod confirmation {
    use super::*;

    fn confirmed(straight_after: bool) -> strata::config::Config {
        config(&format!(
            r#"
stacks:
  app:
    template: {TEMPLATE}
    confirmation:
      auto_scaling_group_id: Asg
      deployment_queue: deployments
      version_message: "app-{{BUILD}}"
      straight_after: {straight_after}
      interval: 1ms
      timeout: 100ms
      env:
        BUILD: "628"
"#
        ))
    }

    fn harness() -> Harness {
        let h = Harness::new();
        h.stacks.script("app", &["UPDATE_COMPLETE"]);
        h.stacks.set_resource("app", "Asg", "asg-1");
        h.scaling.set_instances("asg-1", &["i-1", "i-2"]);
        h
    }

    #[tokio::test]
    async fn every_instance_reporting_the_version_succeeds() {
        let h = harness();
        h.queue
            .push_batch("deployments", &["success:i-1:app-628", "not a message"]);
        h.queue.push_batch("deployments", &[]);
        h.queue.push_batch("deployments", &["success:i-2:app-628"]);

        let run = h
            .builder(SLOW)
            .deploy_stack("app", &confirmed(false).stacks)
            .await
            .unwrap();

        let kinds: Vec<_> = run.diagnostics.warnings().iter().map(|w| w.kind).collect();
        assert_eq!(kinds, vec![WarningKind::MalformedMessage]);
    }

    #[tokio::test]
    async fn a_mismatched_instance_fails_the_deployment() {
        let h = harness();
        h.queue.push_batch("deployments", &["success:i-1:app-628"]);
        h.queue.push_batch(
            "deployments",
            &["success:i-2:app-627", "success:i-2:app-628"],
        );

        let err = h
            .builder(SLOW)
            .deploy_stack("app", &confirmed(true).stacks)
            .await
            .unwrap_err();

        assert_eq!(err.category(), ErrorCategory::Confirmation);
        match err {
            DeployError::BadDeployment { stack, report } => {
                assert_eq!(stack, "app");
                assert_eq!(report.succeeded, vec!["i-1"]);
                assert_eq!(
                    report.failed.get("i-2").map(String::as_str),
                    Some("app-627")
                );
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn silent_instances_time_out() {
        let h = harness();
        h.queue.push_batch("deployments", &["success:i-1:app-628"]);

        let err = h
            .builder(SLOW)
            .deploy_stack("app", &confirmed(false).stacks)
            .await
            .unwrap_err();
        match err {
            DeployError::ConfirmationTimeout { pending, .. } => assert_eq!(pending, vec!["i-2"]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn empty_group_confirms_immediately() {
        let h = Harness::new();
        h.stacks.script("app", &["UPDATE_COMPLETE"]);
        h.stacks.set_resource("app", "Asg", "asg-1");
        h.scaling.set_instances("asg-1", &[]);

        h.builder(SLOW)
            .deploy_stack("app", &confirmed(false).stacks)
            .await
            .unwrap();
    }
}
