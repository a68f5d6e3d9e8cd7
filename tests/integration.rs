use std::{cell::RefCell, rc::Rc, str::from_utf8};

use balance_transfer::{
    account::AccountError,
    bin_utils::Service,
    command::ContractCommandError,
    processor::InvocationError,
};

const TEST_FILE: &str = include_str!("invocations.csv");

#[test]
fn process_invocations() {
    let mut output = Vec::new();
    let errors = Rc::new(RefCell::new(Vec::new()));
    let service = Service {
        input: TEST_FILE.as_bytes(),
        output: &mut output,
        error_printer: Box::new({
            let errors = Rc::clone(&errors);
            move |line, err| errors.borrow_mut().push((line, err))
        }),
    };
    service.run().unwrap();

    // accounts are printed in key order, so the output is stable
    assert_eq!(
        from_utf8(&output).unwrap(),
        concat!(
            "id,owner,balance\n",
            "x,\"{\"\"mspid\"\":\"\"Org1MSP\"\",\"\"id\"\":\"\"user1\"\"}\",69.5\n",
            "y,\"{\"\"mspid\"\":\"\"Org2MSP\"\",\"\"id\"\":\"\"user2\"\"}\",12.25\n",
        )
    );

    let errors = errors.borrow();
    let lines: Vec<u64> = errors.iter().map(|(line, _)| *line).collect();
    assert_eq!(lines, vec![5, 6, 7, 10, 12]);
    assert!(matches!(
        errors[0].1,
        InvocationError::AccountErr(AccountError::Unauthorized { .. })
    ));
    assert!(matches!(
        errors[1].1,
        InvocationError::AccountErr(AccountError::InsufficientFunds { .. })
    ));
    assert!(matches!(
        errors[2].1,
        InvocationError::AccountErr(AccountError::AccountAlreadyExists { .. })
    ));
    assert!(matches!(
        errors[3].1,
        InvocationError::AccountErr(AccountError::InvalidAmount { .. })
    ));
    assert!(matches!(
        errors[4].1,
        InvocationError::CommandErr(ContractCommandError::UnknownFunction { .. })
    ));
}

#[test]
fn malformed_script_aborts() {
    let mut output = Vec::new();
    let service = Service {
        input: "mspid,client,function\nOrg1MSP\n".as_bytes(),
        output: &mut output,
        error_printer: Box::new(|_, _| {}),
    };
    let err = service.run().unwrap_err();
    assert_eq!(err.to_string(), "Malformed invocation at line 2");
    assert!(output.is_empty());
}
