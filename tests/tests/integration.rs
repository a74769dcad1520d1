use std::sync::Arc;
use surrogate_kernel::prelude::*;
use surrogate_kernel::{
    DispatchConfig, GlobalDispatcher, Invocation, ResolutionFailure, RuleError, RuleSet,
    SurrogateFactory, UnmappedPolicy,
};
use surrogate_testing::{
    Account, Counter, Entity, LedgerError, Math, RecordingEquality, init_tracing,
};

fn stats_contract() -> Arc<Contract> {
    Contract::builder("Stats")
        .member("count", vec![])
        .member("max", vec![])
        .member("add", vec![ParamType::Int])
        .member("add", vec![ParamType::Str])
        .member("withdraw", vec![ParamType::Int])
        .member("owner", vec![])
        .build()
}

fn count_rule(counter: &ObjectRef) -> MappingRule {
    MappingRule::field("count", "total")
        .bind(&Counter::target_type(), counter.clone())
        .build()
        .unwrap()
}

fn max_rule() -> MappingRule {
    MappingRule::method("max", "max")
        .on(&Math::target_type())
        .static_access()
        .explicit_param_types(vec![ParamType::Int, ParamType::Int])
        .explicit_args(vec![Value::Int(3), Value::Int(7)])
        .build()
        .unwrap()
}

#[test]
fn test_scenario_a_field_rule_reads_bound_instance() {
    init_tracing();
    let counter = ObjectRef::new(Counter::new(42));
    let mut builder = factory::configured(stats_contract());
    builder.add(count_rule(&counter));

    let stats = builder.build_instance();
    assert_eq!(stats.invoke("count", &[]).unwrap(), Value::Int(42));
}

#[test]
fn test_scenario_b_static_method_with_explicit_args() {
    let contract = Contract::builder("Limits")
        .member("max", vec![])
        .member("max", vec![ParamType::Int])
        .build();
    let mut builder = RuleBuilder::new(contract);
    builder.add(max_rule()).add(
        MappingRule::method("max", "max")
            .signature(vec![ParamType::Int])
            .on(&Math::target_type())
            .static_access()
            .explicit_param_types(vec![ParamType::Int, ParamType::Int])
            .explicit_args(vec![Value::Int(3), Value::Int(7)])
            .build()
            .unwrap(),
    );

    let limits = builder.build_instance();
    assert_eq!(limits.call::<i64>("max", &[]).unwrap(), 7);
    // call-site arguments never reach the target (P6)
    assert_eq!(limits.call::<i64>("max", &[Value::Int(1000)]).unwrap(), 7);
    assert_eq!(limits.call::<i64>("max", &[Value::Int(-5)]).unwrap(), 7);
}

#[test]
fn test_determinism_of_repeated_calls() {
    let counter = ObjectRef::new(Counter::new(9));
    let mut builder = RuleBuilder::new(stats_contract());
    builder.add(count_rule(&counter)).add(
        MappingRule::field("owner", "no_such_field")
            .bind(&Counter::target_type(), counter.clone())
            .build()
            .unwrap(),
    );
    let stats = builder.build_instance();

    for _ in 0..5 {
        assert_eq!(stats.call::<i64>("count", &[]).unwrap(), 9);
        assert!(matches!(
            stats.invoke("owner", &[]),
            Err(DispatchError::MemberResolution {
                source: ResolutionFailure::NoSuchField { .. },
                ..
            })
        ));
    }
}

#[test]
fn test_last_registration_wins() {
    let first = ObjectRef::new(Counter::new(1));
    let second = ObjectRef::new(Counter::new(2));
    let mut builder = RuleBuilder::new(stats_contract());
    builder.add(count_rule(&first)).add(count_rule(&second));

    let stats = builder.build_instance();
    assert_eq!(stats.call::<i64>("count", &[]).unwrap(), 2);
    assert_eq!(builder.rules().len(), 2);
    assert_eq!(builder.build().rules().len(), 1);
}

#[test]
fn test_overloads_resolve_independently() {
    let counter = ObjectRef::new(Counter::new(0));
    let ty = Counter::target_type();
    let mut builder = RuleBuilder::new(stats_contract());
    builder.add_all([
        MappingRule::method("add", "add")
            .signature(vec![ParamType::Int])
            .bind(&ty, counter.clone())
            .build()
            .unwrap(),
        // same surrogate name, different target member per overload
        MappingRule::method("add", "label")
            .signature(vec![ParamType::Str])
            .bind(&ty, counter.clone())
            .explicit_param_types(vec![])
            .explicit_args(vec![])
            .build()
            .unwrap(),
    ]);
    let stats = builder.build_instance();

    assert_eq!(stats.call::<i64>("add", &[Value::Int(5)]).unwrap(), 5);
    assert_eq!(
        stats.call::<String>("add", &[Value::from("5")]).unwrap(),
        "counter at 5"
    );
    assert_eq!(counter.downcast_ref::<Counter>().unwrap().total(), 5);
}

#[test]
fn test_call_site_types_select_target_overload() {
    let counter = ObjectRef::new(Counter::new(10));
    let ty = Counter::target_type();
    let mut builder = RuleBuilder::new(stats_contract());
    for param in [ParamType::Int, ParamType::Str] {
        builder.add(
            MappingRule::method("add", "add")
                .signature(vec![param])
                .bind(&ty, counter.clone())
                .build()
                .unwrap(),
        );
    }
    let stats = builder.build_instance();

    assert_eq!(stats.call::<i64>("add", &[Value::Int(1)]).unwrap(), 11);
    assert_eq!(stats.call::<i64>("add", &[Value::from(" 4 ")]).unwrap(), 15);
}

#[test]
fn test_static_rule_ignores_instances_and_instance_rule_requires_one() {
    let rule = MappingRule::method("max", "max")
        .on(&Math::target_type())
        .static_access()
        .explicit_param_types(vec![ParamType::Int, ParamType::Int])
        .explicit_args(vec![Value::Int(1), Value::Int(2)])
        .build()
        .unwrap();
    assert!(rule.target_instance().is_none());

    let err = MappingRule::field("count", "total")
        .on(&Counter::target_type())
        .build()
        .unwrap_err();
    assert_eq!(err, RuleError::MissingTargetInstance("count".into()));
}

#[test]
fn test_default_members_without_rules() {
    let stats = RuleBuilder::new(stats_contract()).build_instance();

    assert_eq!(stats.to_string(), "Surrogate[multi-target mapping]");
    assert_eq!(
        stats.invoke("to_string", &[]).unwrap(),
        Value::from("Surrogate[multi-target mapping]")
    );
    assert!(stats.equals(stats.as_value()).unwrap());
    assert!(stats.equals(stats.clone()).unwrap());
    assert!(!stats.equals(Value::Int(1)).unwrap());

    let other = RuleBuilder::new(stats_contract()).build_instance();
    assert!(!stats.equals(other).unwrap());
}

#[test]
fn test_custom_equality_is_consulted() {
    let strategy = RecordingEquality::answering(true);
    let mut builder = RuleBuilder::new(stats_contract());
    builder.equality(strategy.clone());
    let stats = builder.build_instance();

    assert!(stats.equals(Value::from("anything")).unwrap());
    assert!(stats.equals(Value::Int(3)).unwrap());
    surrogate_testing::assert_equality_called!(strategy, 2);
    assert_eq!(strategy.history(), vec![Value::from("anything"), Value::Int(3)]);

    // replacing the strategy affects later builds only
    builder.equality(RecordingEquality::answering(false));
    assert!(!builder.build_instance().equals(Value::Unit).unwrap());
    assert!(stats.equals(Value::Unit).unwrap());
}

#[test]
fn test_unmapped_member_policy() {
    let stats = RuleBuilder::new(stats_contract()).build_instance();
    assert_eq!(stats.invoke("count", &[]).unwrap(), Value::Unit);

    let mut strict = RuleBuilder::new(stats_contract());
    strict.config(DispatchConfig::default().with_unmapped(UnmappedPolicy::Fail));
    let err = strict.build_instance().invoke("count", &[]).unwrap_err();
    assert!(matches!(err, DispatchError::UnmappedMember { .. }));

    assert!(matches!(
        stats.invoke("count", &[Value::Int(1)]),
        Err(DispatchError::NotInContract { .. })
    ));
}

#[test]
fn test_target_failure_passes_through_unwrapped() {
    let account = ObjectRef::new(Account::new(7, "ops", 100));
    let mut builder = RuleBuilder::new(stats_contract());
    builder.add(
        MappingRule::method("withdraw", "withdraw")
            .signature(vec![ParamType::Int])
            .bind(&Account::target_type(), account.clone())
            .build()
            .unwrap(),
    );
    let stats = builder.build_instance();

    assert_eq!(stats.call::<i64>("withdraw", &[Value::Int(30)]).unwrap(), 70);

    let err = stats.invoke("withdraw", &[Value::Int(500)]).unwrap_err();
    assert_eq!(err.to_string(), "insufficient funds: balance 70, requested 500");
    let ledger = err
        .into_target()
        .unwrap()
        .downcast::<LedgerError>()
        .unwrap();
    assert_eq!(
        *ledger,
        LedgerError::InsufficientFunds {
            balance: 70,
            requested: 500
        }
    );
    assert_eq!(account.downcast_ref::<Account>().unwrap().balance(), 70);
}

#[test]
fn test_inherited_and_private_members() {
    let account = ObjectRef::new(Account::new(3, "treasury", 5));
    let ty = Account::target_type();
    let contract = Contract::builder("Owner")
        .member("owner", vec![])
        .member("describe", vec![])
        .member("audit", vec![])
        .member("internal", vec![])
        .build();
    let mut builder = RuleBuilder::new(contract);
    builder
        .add(MappingRule::field("owner", "label").bind(&ty, account.clone()).build().unwrap())
        .add(MappingRule::method("describe", "describe").bind(&ty, account.clone()).build().unwrap())
        .add(
            MappingRule::method("audit", "audit")
                .bind(&ty, account.clone())
                .declared_only(true)
                .build()
                .unwrap(),
        )
        // inherited private field: neither view reaches it from the child
        .add(
            MappingRule::field("internal", "internal_ref")
                .bind(&ty, account.clone())
                .build()
                .unwrap(),
        );
    let owner = builder.build_instance();

    assert_eq!(owner.call::<String>("owner", &[]).unwrap(), "treasury");
    assert_eq!(owner.call::<String>("describe", &[]).unwrap(), "treasury#3");
    assert_eq!(owner.call::<String>("audit", &[]).unwrap(), "audit:3:5");
    assert!(matches!(
        owner.invoke("internal", &[]),
        Err(DispatchError::MemberResolution {
            source: ResolutionFailure::Inaccessible { .. },
            ..
        })
    ));
    assert_eq!(surrogate_kernel::reflect::active_overrides(), 0);
}

#[test]
fn test_stitches_several_targets() {
    let counter = ObjectRef::new(Counter::new(12));
    let account = ObjectRef::new(Account::new(1, "main", 40));
    let mut builder = RuleBuilder::new(stats_contract());
    builder
        .add(count_rule(&counter))
        .add(max_rule())
        .add(
            MappingRule::field("owner", "label")
                .bind(&Account::target_type(), account)
                .build()
                .unwrap(),
        );
    let stats = builder.build_instance();

    assert_eq!(stats.call::<i64>("count", &[]).unwrap(), 12);
    assert_eq!(stats.call::<i64>("max", &[]).unwrap(), 7);
    assert_eq!(stats.call::<String>("owner", &[]).unwrap(), "main");
}

#[test]
fn test_concurrent_dispatch_over_shared_rules() {
    let counter = ObjectRef::new(Counter::new(0));
    let mut builder = RuleBuilder::new(stats_contract());
    builder.add(count_rule(&counter)).add(
        MappingRule::method("add", "add")
            .signature(vec![ParamType::Int])
            .bind(&Counter::target_type(), counter.clone())
            .build()
            .unwrap(),
    );
    let stats = builder.build_instance();
    let threads = 8;
    let per_thread = 250;

    std::thread::scope(|scope| {
        for _ in 0..threads {
            let stats = stats.clone();
            scope.spawn(move || {
                for _ in 0..per_thread {
                    stats.invoke("add", &[Value::Int(1)]).unwrap();
                    assert!(stats.call::<i64>("count", &[]).unwrap() > 0);
                }
            });
        }
    });

    assert_eq!(stats.call::<i64>("count", &[]).unwrap(), threads * per_thread);
}

#[test]
fn test_repeated_builds_share_frozen_rules_without_leaking_later_adds() {
    let counter = ObjectRef::new(Counter::new(1));
    let mut builder = RuleBuilder::new(stats_contract());
    builder.add(count_rule(&counter));

    let first = builder.build();
    let second = builder.build();
    builder.add(max_rule());
    let third = builder.build();

    assert_eq!(first.rules().len(), 1);
    assert_eq!(second.rules().len(), 1);
    assert_eq!(third.rules().len(), 2);

    let contract = stats_contract();
    let receiver = ObjectRef::new(());
    let member = contract.resolve("max", &[]).unwrap();
    assert_eq!(
        first.dispatch(Invocation::new(&receiver, member, &[])).unwrap(),
        Value::Unit
    );
    assert_eq!(
        third.dispatch(Invocation::new(&receiver, member, &[])).unwrap(),
        Value::Int(7)
    );
}

#[test]
fn test_dispatcher_can_be_built_from_a_bare_rule_set() {
    let counter = ObjectRef::new(Counter::new(3));
    let rules: RuleSet = [count_rule(&counter)].into_iter().collect();
    let dispatcher = GlobalDispatcher::new(Arc::new(rules.freeze()));
    let stats = factory::DynamicSurrogateFactory.create(stats_contract(), Arc::new(dispatcher));
    assert_eq!(stats.call::<i64>("count", &[]).unwrap(), 3);
}

struct Desk;

fn account_param() -> ParamType {
    ParamType::object(Account::TYPE_NAME).unwrap()
}

fn counter_param() -> ParamType {
    ParamType::object(Counter::TYPE_NAME).unwrap()
}

fn desk_type() -> Arc<TargetType> {
    TargetType::builder::<Desk>("office::Desk")
        .static_method("inspect", vec![account_param()], |args: &[Value]| {
            let obj = args[0].extract::<ObjectRef>()?;
            let account = obj.downcast_ref::<Account>().ok_or("not an account")?;
            Ok(format!("account:{}", account.entity.label))
        })
        .static_method("inspect", vec![counter_param()], |args: &[Value]| {
            let obj = args[0].extract::<ObjectRef>()?;
            let counter = obj.downcast_ref::<Counter>().ok_or("not a counter")?;
            Ok(format!("counter:{}", counter.total()))
        })
        .static_method("echo", vec![ParamType::Any], |args: &[Value]| {
            Ok(format!("any:{}", args[0]))
        })
        .build()
}

#[test]
fn test_overloads_are_told_apart_by_object_type_and_specificity() {
    // objects answer to qualified names once their type is described
    Account::target_type();
    let counter = ObjectRef::new(Counter::new(5));
    let account = ObjectRef::new(Account::new(8, "payroll", 0));
    let desk = desk_type();

    let contract = Contract::builder("Router")
        .member("route", vec![account_param()])
        .member("route", vec![counter_param()])
        .member("add", vec![ParamType::Any])
        .member("add", vec![ParamType::Int])
        .build();
    let mut builder = RuleBuilder::new(contract);
    for param in [account_param(), counter_param()] {
        builder.add(
            MappingRule::method("route", "inspect")
                .signature(vec![param])
                .on(&desk)
                .static_access()
                .build()
                .unwrap(),
        );
    }
    builder
        .add(
            MappingRule::method("add", "echo")
                .signature(vec![ParamType::Any])
                .on(&desk)
                .static_access()
                .build()
                .unwrap(),
        )
        .add(
            MappingRule::method("add", "add")
                .signature(vec![ParamType::Int])
                .bind(&Counter::target_type(), counter.clone())
                .build()
                .unwrap(),
        );
    let router = builder.build_instance();

    assert_eq!(
        router.call::<String>("route", &[Value::Object(counter.clone())]).unwrap(),
        "counter:5"
    );
    assert_eq!(
        router.call::<String>("route", &[Value::Object(account)]).unwrap(),
        "account:payroll"
    );
    match router.invoke("route", &[Value::Unit]) {
        Err(DispatchError::AmbiguousCall { candidates, .. }) => assert_eq!(
            candidates,
            vec!["route(ledger::Account)", "route(demo::Counter)"]
        ),
        other => panic!("expected an ambiguous call, got {other:?}"),
    }
    assert!(matches!(
        router.invoke("route", &[Value::Int(1)]),
        Err(DispatchError::NotInContract { .. })
    ));

    // `add(any)` is declared first but `add(i64)` is the closer fit
    assert_eq!(router.call::<i64>("add", &[Value::Int(2)]).unwrap(), 7);
    assert_eq!(router.call::<String>("add", &[Value::from("x")]).unwrap(), "any:x");
}

#[test]
fn test_subtype_argument_prefers_the_nearest_overload() {
    Account::target_type();
    let contract = Contract::builder("Greeter")
        .member("greet", vec![ParamType::object(Entity::TYPE_NAME).unwrap()])
        .member("greet", vec![account_param()])
        .build();
    let account = Value::Object(ObjectRef::new(Account::new(1, "ops", 0)));
    let entity = Value::Object(ObjectRef::new(Entity {
        id: 2,
        label: "hq".into(),
    }));

    let chosen = contract.resolve("greet", &[account]).unwrap();
    assert_eq!(chosen.sig().params(), &[account_param()]);
    let chosen = contract.resolve("greet", &[entity]).unwrap();
    assert_eq!(chosen.sig().params()[0].qualified_name(), Entity::TYPE_NAME);
    assert!(contract.resolve("greet", &[Value::Object(ObjectRef::new(Counter::new(0)))]).is_err());
}

#[test]
fn test_typed_equals_is_answered_as_the_default_member() {
    Account::target_type();
    let contract = Contract::builder("Peer")
        .member("equals", vec![account_param()])
        .build();
    let account = Value::Object(ObjectRef::new(Account::new(3, "peer", 0)));

    let plain = RuleBuilder::new(Arc::clone(&contract)).build_instance();
    assert_eq!(plain.invoke("equals", &[account.clone()]).unwrap(), Value::Bool(false));

    let strategy = RecordingEquality::answering(true);
    let mut builder = RuleBuilder::new(contract);
    builder.equality(strategy.clone());
    let peer = builder.build_instance();
    assert_eq!(peer.invoke("equals", &[account]).unwrap(), Value::Bool(true));
    surrogate_testing::assert_equality_called!(strategy, 1);
}
