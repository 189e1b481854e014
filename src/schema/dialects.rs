use super::Condition;
use super::Field;
use super::Literal;
use super::Node;

const PLATFORMS: &[&str] = &["jetson_agx_xavier"];
const EVENT_SOURCES: &[&str] = &["all_events", "config", "cli"];
const MODES: &[&str] = &["characterization", "profile", "num_passes"];

/// `parameters` is an open map copied into the fragment; benchmarks carry `libs`.
pub(super) fn launcher() -> Vec<Field> {
  vec![
    Field::new("parameters", Node::map_of(Node::value())).required(),
    Field::new(
      "benchmarks",
      Node::list(Node::dict(vec![
        Field::new("name", Node::string()).required(),
        Field::new("libs", Node::string()).nullable(),
        Field::new("path", Node::path()).required(),
        Field::new("args", Node::string()).nullable(),
      ])),
    )
    .required(),
  ]
}

pub(super) fn voltmeter() -> Vec<Field> {
  vec![
    Field::new(
      "param-platform",
      Node::dict(vec![
        Field::new("platform", Node::string().allowed(PLATFORMS)).required(),
        profiling_switch("profile_cpu", "frequencies_cpu"),
        profiling_switch("profile_gpu", "frequencies_gpu"),
        frequencies("frequencies_cpu", "profile_cpu"),
        frequencies("frequencies_gpu", "profile_gpu"),
      ]),
    )
    .required(),
    Field::new(
      "param-profiler",
      Node::dict(vec![
        Field::new("num_run", Node::integer().min(1))
          .required()
          .with_default(Literal::Int(3)),
        Field::new("sample_period_us", Node::integer().min(1))
          .required()
          .with_default(Literal::Int(100_000)),
      ]),
    )
    .required(),
    Field::new(
      "arguments",
      Node::dict(vec![
        Field::new("events", Node::string().allowed(EVENT_SOURCES))
          .required()
          .constraint(Condition::any([
            Condition::equals("events", Literal::Str("all_events")),
            Condition::all([
              Condition::equals("events", Literal::Str("config")),
              Condition::any([
                Condition::present("config_cpu"),
                Condition::present("config_gpu"),
              ]),
            ]),
            Condition::all([
              Condition::equals("events", Literal::Str("cli")),
              Condition::any([Condition::present("cli_cpu"), Condition::present("cli_gpu")]),
            ]),
          ])),
        event_config("config_cpu"),
        event_config("config_gpu"),
        event_list("cli_cpu", true),
        event_list("cli_gpu", true),
        Field::new("mode", Node::string().allowed(MODES)).required(),
        Field::new("trace_dir", Node::path()).required(),
        Field::new(
          "benchmarks",
          Node::list(Node::dict(vec![
            Field::new("name", Node::string()),
            Field::new("path", Node::path()).required(),
            Field::new("args", Node::text()).nullable(),
          ]))
          .non_empty(),
        )
        .required()
        .forbidden_when(Condition::equals("mode", Literal::Str("num_passes"))),
      ]),
    )
    .required(),
  ]
}

pub(super) fn voltmeter_legacy() -> Vec<Field> {
  vec![
    Field::new(
      "param-platform",
      Node::dict(vec![
        Field::new("PLATFORM", Node::string().allowed(PLATFORMS)).required(),
        Field::new("PROFILE_CPU", Node::boolean())
          .required()
          .with_default(Literal::Bool(false)),
        Field::new("PROFILE_GPU", Node::boolean())
          .required()
          .with_default(Literal::Bool(false)),
      ]),
    )
    .required(),
    Field::new(
      "param-profiler",
      Node::dict(vec![
        Field::new("NUM_RUN", Node::integer().min(1))
          .required()
          .with_default(Literal::Int(3)),
        Field::new("SAMPLE_PERIOD_US", Node::integer().min(1))
          .required()
          .with_default(Literal::Int(100_000)),
      ]),
    )
    .required(),
    Field::new(
      "arguments",
      Node::dict(vec![
        Field::new("events", Node::string().allowed(EVENT_SOURCES)),
        event_config("config_cpu"),
        event_config("config_gpu"),
        event_list("cli_cpu", false),
        event_list("cli_gpu", false),
        Field::new("mode", Node::string().allowed(MODES)).required(),
        Field::new("trace_dir", Node::path()).required(),
        Field::new(
          "benchmarks",
          Node::list(Node::dict(vec![
            Field::new("name", Node::string()).required(),
            Field::new("path", Node::path()).required(),
            Field::new("args", Node::text()).nullable(),
          ])),
        )
        .required(),
      ]),
    )
    .required(),
  ]
}

/// `profile_*` defaults to off; switching it on requires the matching frequency list.
fn profiling_switch(name: &'static str, frequencies: &'static str) -> Field {
  Field::new(name, Node::boolean())
    .required()
    .with_default(Literal::Bool(false))
    .constraint(Condition::any([
      Condition::equals(name, Literal::Bool(false)),
      Condition::all([
        Condition::equals(name, Literal::Bool(true)),
        Condition::present(frequencies),
      ]),
    ]))
}

fn frequencies(name: &'static str, switch: &'static str) -> Field {
  Field::new(name, Node::list(Node::integer().min(1)).non_empty())
    .depends_on(Condition::equals(switch, Literal::Bool(true)))
}

fn event_config(name: &'static str) -> Field {
  Field::new(name, Node::path()).depends_on(Condition::equals("events", Literal::Str("config")))
}

fn event_list(name: &'static str, non_empty: bool) -> Field {
  let list = Node::list(Node::integer().min(0));
  let list = if non_empty { list.non_empty() } else { list };
  Field::new(name, list).depends_on(Condition::equals("events", Literal::Str("cli")))
}
