use super::records::PgRecord;
use super::PgStore;
use crate::hrm::model::{
    Attendance, Employee, EmployeeSalary, LeaveApplication, LeaveBalance, LeaveType,
    SalaryComponent, SalaryDetail, SalaryMonth, SalaryStructure, StructureComponent,
};
use crate::store::{HrmStore, StoreResult};
use chrono::NaiveDate;
use sea_query::{Condition, Expr, ExprTrait, Query};
use uuid::Uuid;

fn eq(column: &'static str, id: Uuid) -> Condition {
    Condition::all().add(Expr::col(column).eq(id))
}

impl HrmStore for PgStore {
    fn insert_employee(&self, value: &Employee) -> StoreResult<()> {
        self.insert_record(value)
    }

    fn update_employee(&self, value: &Employee) -> StoreResult<()> {
        self.update_record(value)
    }

    fn get_employee(&self, id: Uuid) -> StoreResult<Option<Employee>> {
        self.get_record(id)
    }

    fn list_employees(&self) -> StoreResult<Vec<Employee>> {
        self.list_by(Condition::all(), &["employee_code"])
    }

    fn insert_salary_component(&self, value: &SalaryComponent) -> StoreResult<()> {
        self.insert_record(value)
    }

    fn get_salary_component(&self, id: Uuid) -> StoreResult<Option<SalaryComponent>> {
        self.get_record(id)
    }

    fn list_salary_components(&self) -> StoreResult<Vec<SalaryComponent>> {
        self.list_by(Condition::all(), &["code"])
    }

    fn insert_salary_structure(&self, value: &SalaryStructure) -> StoreResult<()> {
        self.insert_record(value)
    }

    fn update_salary_structure(&self, value: &SalaryStructure) -> StoreResult<()> {
        self.update_record(value)
    }

    fn get_salary_structure(&self, id: Uuid) -> StoreResult<Option<SalaryStructure>> {
        self.get_record(id)
    }

    fn find_structure_for_employee(
        &self,
        employee_id: Uuid,
    ) -> StoreResult<Option<SalaryStructure>> {
        self.find_by("employee_id", employee_id)
    }

    fn insert_structure_component(&self, value: &StructureComponent) -> StoreResult<()> {
        self.insert_record(value)
    }

    fn update_structure_component(&self, value: &StructureComponent) -> StoreResult<()> {
        self.update_record(value)
    }

    fn delete_structure_component(&self, id: Uuid) -> StoreResult<bool> {
        self.delete_record::<StructureComponent>(id)
    }

    fn get_structure_component(&self, id: Uuid) -> StoreResult<Option<StructureComponent>> {
        self.get_record(id)
    }

    fn components_for_structure(
        &self,
        structure_id: Uuid,
    ) -> StoreResult<Vec<StructureComponent>> {
        self.list_by(eq("structure_id", structure_id), &["created_at", "id"])
    }

    fn insert_leave_type(&self, value: &LeaveType) -> StoreResult<()> {
        self.insert_record(value)
    }

    fn get_leave_type(&self, id: Uuid) -> StoreResult<Option<LeaveType>> {
        self.get_record(id)
    }

    fn insert_leave_application(&self, value: &LeaveApplication) -> StoreResult<()> {
        self.insert_record(value)
    }

    fn update_leave_application(&self, value: &LeaveApplication) -> StoreResult<()> {
        self.update_record(value)
    }

    fn delete_leave_application(&self, id: Uuid) -> StoreResult<bool> {
        self.delete_record::<LeaveApplication>(id)
    }

    fn get_leave_application(&self, id: Uuid) -> StoreResult<Option<LeaveApplication>> {
        self.get_record(id)
    }

    fn leave_applications_for_employee(
        &self,
        employee_id: Uuid,
    ) -> StoreResult<Vec<LeaveApplication>> {
        self.list_by(eq("employee_id", employee_id), &["start_date", "created_at"])
    }

    fn find_leave_balance(
        &self,
        employee_id: Uuid,
        leave_type_id: Uuid,
        year: i32,
    ) -> StoreResult<Option<LeaveBalance>> {
        self.fetch_one(&Self::select::<LeaveBalance>(
            eq("employee_id", employee_id)
                .add(Expr::col("leave_type_id").eq(leave_type_id))
                .add(Expr::col("year").eq(year)),
            &[],
        ))
    }

    fn insert_leave_balance(&self, value: &LeaveBalance) -> StoreResult<()> {
        self.insert_record(value)
    }

    fn update_leave_balance(&self, value: &LeaveBalance) -> StoreResult<()> {
        self.update_record(value)
    }

    fn insert_attendance(&self, value: &Attendance) -> StoreResult<()> {
        self.insert_record(value)
    }

    fn update_attendance(&self, value: &Attendance) -> StoreResult<()> {
        self.update_record(value)
    }

    fn attendance_between(
        &self,
        employee_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StoreResult<Vec<Attendance>> {
        self.list_by(
            eq("employee_id", employee_id)
                .add(Expr::col("date").gte(from))
                .add(Expr::col("date").lte(to)),
            &["date"],
        )
    }

    fn insert_salary_month(&self, value: &SalaryMonth) -> StoreResult<()> {
        self.insert_record(value)
    }

    fn update_salary_month(&self, value: &SalaryMonth) -> StoreResult<()> {
        self.update_record(value)
    }

    fn find_salary_month(&self, year: i32, month: i32) -> StoreResult<Option<SalaryMonth>> {
        self.fetch_one(&Self::select::<SalaryMonth>(
            Condition::all()
                .add(Expr::col("year").eq(year))
                .add(Expr::col("month").eq(month)),
            &[],
        ))
    }

    fn insert_employee_salary(&self, value: &EmployeeSalary) -> StoreResult<()> {
        self.insert_record(value)
    }

    fn salaries_for_month(&self, salary_month_id: Uuid) -> StoreResult<Vec<EmployeeSalary>> {
        self.list_by(
            eq("salary_month_id", salary_month_id),
            &["created_at", "employee_id"],
        )
    }

    fn delete_salaries_for_month(&self, salary_month_id: Uuid) -> StoreResult<u64> {
        let salaries = Query::select()
            .column("id")
            .from(EmployeeSalary::TABLE)
            .and_where(Expr::col("salary_month_id").eq(salary_month_id))
            .to_owned();
        self.delete_where(
            SalaryDetail::TABLE,
            Condition::all().add(Expr::col("employee_salary_id").in_subquery(salaries)),
        )?;
        self.delete_where(EmployeeSalary::TABLE, eq("salary_month_id", salary_month_id))
    }

    fn insert_salary_detail(&self, value: &SalaryDetail) -> StoreResult<()> {
        self.insert_record(value)
    }

    fn details_for_salary(&self, employee_salary_id: Uuid) -> StoreResult<Vec<SalaryDetail>> {
        self.list_by(eq("employee_salary_id", employee_salary_id), &["created_at", "id"])
    }
}
